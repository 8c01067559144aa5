//! Interface to the external zone scheduler.
//!
//! The scheduler owns zones and their worker threads. The bridge only hands it
//! validated requests and completion closures, and holds [`ZoneHandle`]s.

use zone_types::{ExecuteRequest, ExecuteResponse, ResponseCode, ZoneHandle};

use crate::error::ZoneError;

/// Completion closure for an async execute. Called at most once, from any thread.
pub type ExecuteCallback = Box<dyn FnOnce(ExecuteResponse) + Send>;

/// Completion closure for an async broadcast. Called at most once, from any thread.
pub type BroadcastCallback = Box<dyn FnOnce(ResponseCode) + Send>;

pub trait ZoneScheduler: Send + Sync {
    /// Create a zone from a flattened ` --key value` configuration string.
    fn create_zone(&self, id: &str, config: &str) -> Result<ZoneHandle, ZoneError>;

    /// Look up a registered zone. Fails with [`ZoneError::NotFound`].
    fn get_zone(&self, id: &str) -> Result<ZoneHandle, ZoneError>;

    /// Run `request` on one worker; `on_complete` receives the response.
    fn execute(&self, zone: &ZoneHandle, request: ExecuteRequest, on_complete: ExecuteCallback);

    /// Run `request` and block the calling thread until it finishes.
    fn execute_sync(&self, zone: &ZoneHandle, request: ExecuteRequest) -> ExecuteResponse;

    /// Run `source` on every worker; `on_complete` receives the unified code.
    fn broadcast(&self, zone: &ZoneHandle, source: String, on_complete: BroadcastCallback);

    /// Run `source` on every worker and block until all have finished.
    fn broadcast_sync(&self, zone: &ZoneHandle, source: &str) -> ResponseCode;
}
