//! Shared test utilities and fixtures
//!
//! Spy schedulers standing in for a real zone scheduler.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;

use zone_bridge::{
    BroadcastCallback, EventLoop, ExecuteCallback, ExecuteRequest, ExecuteResponse, ResponseCode,
    Zone, ZoneError, ZoneHandle, ZoneScheduler, ZoneSettings,
};

/// One call the spy saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateZone { id: String, config: String },
    GetZone { id: String },
    Execute(ExecuteRequest),
    ExecuteSync(ExecuteRequest),
    Broadcast(String),
    BroadcastSync(String),
}

/// Records every call. Async completions are delivered from a fresh thread,
/// the way a real scheduler's worker would.
pub struct SpyScheduler {
    calls: Mutex<Vec<Call>>,
    response: ExecuteResponse,
    broadcast_code: ResponseCode,
    /// When set, async callbacks are dropped instead of invoked.
    lose_callbacks: bool,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl SpyScheduler {
    pub fn new(response: ExecuteResponse) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            response,
            broadcast_code: ResponseCode::SUCCESS,
            lose_callbacks: false,
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_broadcast_code(mut self, code: ResponseCode) -> Self {
        self.broadcast_code = code;
        self
    }

    pub fn losing_callbacks(mut self) -> Self {
        self.lose_callbacks = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait for every completion thread spawned so far.
    pub fn join_workers(&self) {
        let workers: Vec<_> = self.workers.lock().unwrap().drain(..).collect();
        for worker in workers {
            worker.join().unwrap();
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn complete_on_worker(&self, f: impl FnOnce() + Send + 'static) {
        let handle = thread::spawn(f);
        self.workers.lock().unwrap().push(handle);
    }
}

impl ZoneScheduler for SpyScheduler {
    fn create_zone(&self, id: &str, config: &str) -> Result<ZoneHandle, ZoneError> {
        self.record(Call::CreateZone {
            id: id.to_string(),
            config: config.to_string(),
        });
        Ok(ZoneHandle::new(id))
    }

    fn get_zone(&self, id: &str) -> Result<ZoneHandle, ZoneError> {
        self.record(Call::GetZone { id: id.to_string() });
        if id == "z1" {
            Ok(ZoneHandle::new(id))
        } else {
            Err(ZoneError::NotFound { id: id.to_string() })
        }
    }

    fn execute(&self, _zone: &ZoneHandle, request: ExecuteRequest, on_complete: ExecuteCallback) {
        self.record(Call::Execute(request));
        let response = self.response.clone();
        if self.lose_callbacks {
            self.complete_on_worker(move || drop(on_complete));
        } else {
            self.complete_on_worker(move || on_complete(response));
        }
    }

    fn execute_sync(&self, _zone: &ZoneHandle, request: ExecuteRequest) -> ExecuteResponse {
        self.record(Call::ExecuteSync(request));
        self.response.clone()
    }

    fn broadcast(&self, _zone: &ZoneHandle, source: String, on_complete: BroadcastCallback) {
        self.record(Call::Broadcast(source));
        let code = self.broadcast_code;
        self.complete_on_worker(move || on_complete(code));
    }

    fn broadcast_sync(&self, _zone: &ZoneHandle, source: &str) -> ResponseCode {
        self.record(Call::BroadcastSync(source.to_string()));
        self.broadcast_code
    }
}

/// Bind zone "z1" on `spy` through a new loop.
pub fn bind(spy: &Arc<SpyScheduler>) -> (EventLoop, Zone) {
    let event_loop = EventLoop::new();
    let zone = Zone::create(
        Arc::clone(spy) as Arc<dyn ZoneScheduler>,
        event_loop.bridge(),
        "z1",
        ZoneSettings::new(),
    )
    .unwrap();
    (event_loop, zone)
}
