//! Zone facade: the public API consumed by the embedding runtime.
//!
//! A [`Zone`] binds to exactly one scheduler-owned zone at construction and
//! stays bound for its lifetime. Construction IS binding: there is no unbound
//! state to check at call time.
//!
//! Async calls validate, hand off and return. Their callbacks run on the
//! [`EventLoop`](crate::EventLoop) that owns the zone's [`CompletionBridge`].
//! Sync calls block the calling thread on the scheduler and never touch the
//! bridge.

use std::sync::Arc;

use serde_json::Value;
use zone_types::{BroadcastResult, ExecuteResponse, ResponseCode, ZoneHandle, ZoneSettings};

use crate::completion::CompletionBridge;
use crate::error::{BridgeError, ValidationError};
use crate::request;
use crate::response::{self, DecodedResponse};
use crate::scheduler::ZoneScheduler;

/// How a [`Zone`] binds. Chosen explicitly, never inferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneInit {
    /// Create a new zone with the given settings.
    Create { id: String, settings: ZoneSettings },
    /// Bind to an already registered zone.
    Get { id: String },
}

impl ZoneInit {
    #[must_use]
    pub fn create(id: impl Into<String>, settings: ZoneSettings) -> Self {
        Self::Create {
            id: id.into(),
            settings,
        }
    }

    /// `Create` from a settings object in the runtime's native form.
    pub fn create_from_json(
        id: impl Into<String>,
        settings: &Value,
    ) -> Result<Self, ValidationError> {
        Ok(Self::create(id, ZoneSettings::from_json(settings)?))
    }

    #[must_use]
    pub fn get(id: impl Into<String>) -> Self {
        Self::Get { id: id.into() }
    }
}

pub struct Zone {
    scheduler: Arc<dyn ZoneScheduler>,
    bridge: CompletionBridge,
    handle: ZoneHandle,
}

impl Zone {
    /// Bind a zone through `scheduler`; async callbacks are delivered via `bridge`.
    pub fn new(
        scheduler: Arc<dyn ZoneScheduler>,
        bridge: CompletionBridge,
        init: ZoneInit,
    ) -> Result<Self, BridgeError> {
        let handle = match init {
            ZoneInit::Create { id, settings } => {
                let config = settings.to_config_string();
                tracing::info!(zone = %id, config = %config, "Creating zone");
                scheduler.create_zone(&id, &config)?
            }
            ZoneInit::Get { id } => {
                tracing::debug!(zone = %id, "Looking up zone");
                scheduler.get_zone(&id)?
            }
        };

        Ok(Self {
            scheduler,
            bridge,
            handle,
        })
    }

    pub fn create(
        scheduler: Arc<dyn ZoneScheduler>,
        bridge: CompletionBridge,
        id: impl Into<String>,
        settings: ZoneSettings,
    ) -> Result<Self, BridgeError> {
        Self::new(scheduler, bridge, ZoneInit::create(id, settings))
    }

    pub fn get(
        scheduler: Arc<dyn ZoneScheduler>,
        bridge: CompletionBridge,
        id: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        Self::new(scheduler, bridge, ZoneInit::get(id))
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.handle.id()
    }

    #[must_use]
    pub fn handle(&self) -> &ZoneHandle {
        &self.handle
    }

    /// Submit a call and return immediately.
    ///
    /// `callback` runs on the loop thread with the decoded response. Invalid
    /// input is rejected here, before the scheduler sees anything.
    pub fn execute<C>(&self, input: &Value, callback: C) -> Result<(), ValidationError>
    where
        C: FnOnce(DecodedResponse) + 'static,
    {
        let request = request::build(input)?;
        tracing::debug!(
            zone = %self.handle,
            module = request.module(),
            function = request.function().as_str(),
            "Submitting execute"
        );

        let completion = self
            .bridge
            .register(callback, |raw: ExecuteResponse| response::decode(&raw));
        self.scheduler.execute(
            &self.handle,
            request,
            Box::new(move |raw: ExecuteResponse| {
                completion.dispatch(raw);
            }),
        );
        Ok(())
    }

    /// Run a call and block until the decoded response is available.
    pub fn execute_sync(&self, input: &Value) -> Result<DecodedResponse, ValidationError> {
        let request = request::build(input)?;
        tracing::debug!(
            zone = %self.handle,
            module = request.module(),
            function = request.function().as_str(),
            "Executing synchronously"
        );

        let raw = self.scheduler.execute_sync(&self.handle, request);
        Ok(response::decode(&raw))
    }

    /// Run `source` on every worker and return immediately.
    ///
    /// `callback` runs on the loop thread with the unified result.
    pub fn broadcast<C>(&self, source: impl Into<String>, callback: C)
    where
        C: FnOnce(BroadcastResult) + 'static,
    {
        tracing::debug!(zone = %self.handle, "Submitting broadcast");
        let completion = self
            .bridge
            .register(callback, |code: ResponseCode| BroadcastResult::from(code));
        self.scheduler.broadcast(
            &self.handle,
            source.into(),
            Box::new(move |code: ResponseCode| {
                completion.dispatch(code);
            }),
        );
    }

    /// Run `source` on every worker and block until all have finished.
    #[must_use]
    pub fn broadcast_sync(&self, source: &str) -> BroadcastResult {
        tracing::debug!(zone = %self.handle, "Broadcasting synchronously");
        BroadcastResult::from(self.scheduler.broadcast_sync(&self.handle, source))
    }
}

impl std::fmt::Debug for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zone").field("handle", &self.handle).finish()
    }
}
