//! In-process zone scheduler.
//!
//! Each zone owns a multi-threaded tokio runtime sized by its `--workers`
//! setting. Functions run on the runtime's blocking pool so a slow native
//! function never stalls the zone's async workers, and so a timeout can be
//! reported while the function is still running.

use std::collections::HashMap;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::{Builder, Runtime};
use zone_bridge::{BroadcastCallback, ExecuteCallback, ZoneError, ZoneScheduler};
use zone_types::{ExecuteRequest, ExecuteResponse, ResponseCode, ZoneHandle};

use crate::codes;
use crate::config::LocalZoneConfig;
use crate::registry::{BroadcastHandler, FunctionRegistry};

struct LocalZone {
    workers: usize,
    /// Always `Some` until drop.
    runtime: Option<Runtime>,
}

impl LocalZone {
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(runtime) = &self.runtime {
            runtime.spawn(future);
        }
    }
}

impl Drop for LocalZone {
    fn drop(&mut self) {
        // Dropping a runtime blocks; that panics when the last reference goes
        // away inside another runtime's async context.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// A [`ZoneScheduler`] that runs registered native functions in-process.
pub struct LocalScheduler {
    registry: Arc<FunctionRegistry>,
    zones: Mutex<HashMap<String, Arc<LocalZone>>>,
}

impl LocalScheduler {
    #[must_use]
    pub fn new(registry: FunctionRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            zones: Mutex::new(HashMap::new()),
        }
    }

    /// Ids of all registered zones, sorted.
    #[must_use]
    pub fn zone_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock_zones().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Worker count of a registered zone.
    #[must_use]
    pub fn workers(&self, zone: &ZoneHandle) -> Option<usize> {
        self.lookup(zone).map(|z| z.workers)
    }

    fn lock_zones(&self) -> MutexGuard<'_, HashMap<String, Arc<LocalZone>>> {
        self.zones.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, zone: &ZoneHandle) -> Option<Arc<LocalZone>> {
        self.lock_zones().get(zone.id()).cloned()
    }
}

impl ZoneScheduler for LocalScheduler {
    fn create_zone(&self, id: &str, config: &str) -> Result<ZoneHandle, ZoneError> {
        let parsed = LocalZoneConfig::parse(config).map_err(|e| ZoneError::InvalidConfig {
            id: id.to_string(),
            message: e.to_string(),
        })?;

        let mut zones = self.lock_zones();
        if zones.contains_key(id) {
            return Err(ZoneError::AlreadyExists { id: id.to_string() });
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(parsed.workers())
            .thread_name(format!("zone-{id}"))
            .enable_time()
            .build()
            .map_err(|e| ZoneError::CreateFailed {
                id: id.to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(zone = id, workers = parsed.workers(), "Zone started");
        zones.insert(
            id.to_string(),
            Arc::new(LocalZone {
                workers: parsed.workers(),
                runtime: Some(runtime),
            }),
        );
        Ok(ZoneHandle::new(id))
    }

    fn get_zone(&self, id: &str) -> Result<ZoneHandle, ZoneError> {
        if self.lock_zones().contains_key(id) {
            Ok(ZoneHandle::new(id))
        } else {
            Err(ZoneError::NotFound { id: id.to_string() })
        }
    }

    fn execute(&self, zone: &ZoneHandle, request: ExecuteRequest, on_complete: ExecuteCallback) {
        let Some(local) = self.lookup(zone) else {
            on_complete(ExecuteResponse::failure(
                codes::INTERNAL_ERROR,
                format!("zone '{zone}' is not registered"),
            ));
            return;
        };

        let registry = Arc::clone(&self.registry);
        local.spawn(async move {
            let response = run_request(&registry, request).await;
            on_complete(response);
        });
    }

    fn execute_sync(&self, zone: &ZoneHandle, request: ExecuteRequest) -> ExecuteResponse {
        let (tx, rx) = std_mpsc::sync_channel(1);
        self.execute(
            zone,
            request,
            Box::new(move |response| {
                let _ = tx.send(response);
            }),
        );
        rx.recv().unwrap_or_else(|_| {
            ExecuteResponse::failure(codes::INTERNAL_ERROR, "zone stopped before completing")
        })
    }

    fn broadcast(&self, zone: &ZoneHandle, source: String, on_complete: BroadcastCallback) {
        let Some(local) = self.lookup(zone) else {
            tracing::warn!(zone = %zone, "Broadcast to unregistered zone");
            on_complete(codes::INTERNAL_ERROR);
            return;
        };

        let handler = self.registry.broadcast_handler();
        let workers = local.workers;
        local.spawn(async move {
            let code = run_broadcast(handler, workers, source).await;
            on_complete(code);
        });
    }

    fn broadcast_sync(&self, zone: &ZoneHandle, source: &str) -> ResponseCode {
        let (tx, rx) = std_mpsc::sync_channel(1);
        self.broadcast(
            zone,
            source.to_string(),
            Box::new(move |code| {
                let _ = tx.send(code);
            }),
        );
        rx.recv().unwrap_or(codes::INTERNAL_ERROR)
    }
}

async fn run_request(registry: &FunctionRegistry, request: ExecuteRequest) -> ExecuteResponse {
    let name = if request.module().is_empty() {
        request.function().to_string()
    } else {
        format!("{}.{}", request.module(), request.function().as_str())
    };

    let Some(function) = registry.lookup(request.module(), request.function()) else {
        return ExecuteResponse::failure(
            codes::FUNCTION_NOT_FOUND,
            format!("function '{name}' is not registered"),
        );
    };

    let timeout = request.timeout();
    let task = tokio::task::spawn_blocking(move || function(request.arguments()));
    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::debug!(function = %name, ?limit, "Execution timed out");
                return ExecuteResponse::failure(
                    codes::TIMEOUT,
                    format!("function '{name}' timed out after {} ms", limit.as_millis()),
                );
            }
        },
        None => task.await,
    };

    match joined {
        Ok(Ok(value)) => ExecuteResponse::success(value),
        Ok(Err(message)) => ExecuteResponse::failure(codes::EXECUTE_FUNC_ERROR, message),
        Err(e) => {
            tracing::warn!(function = %name, error = %e, "Native function panicked");
            ExecuteResponse::failure(codes::INTERNAL_ERROR, format!("function '{name}' panicked"))
        }
    }
}

async fn run_broadcast(
    handler: Option<BroadcastHandler>,
    workers: usize,
    source: String,
) -> ResponseCode {
    let Some(handler) = handler else {
        tracing::debug!("No broadcast handler registered; nothing to run");
        return codes::SUCCESS;
    };

    let source: Arc<str> = Arc::from(source);
    let tasks: Vec<_> = (0..workers)
        .map(|_| {
            let handler = Arc::clone(&handler);
            let source = Arc::clone(&source);
            tokio::task::spawn_blocking(move || handler(&source))
        })
        .collect();

    let mut code = codes::SUCCESS;
    for task in tasks {
        let outcome = match task.await {
            Ok(Ok(())) => continue,
            Ok(Err(message)) => {
                tracing::warn!(error = %message, "Broadcast script failed");
                codes::BROADCAST_SCRIPT_ERROR
            }
            Err(e) => {
                tracing::warn!(error = %e, "Broadcast handler panicked");
                codes::INTERNAL_ERROR
            }
        };
        if code.is_success() {
            code = outcome;
        }
    }
    code
}
