//! Execution bridge between a single-threaded embedding runtime and a zone scheduler.
//!
//! The embedding thread builds requests from loosely-typed input, hands them to
//! a [`ZoneScheduler`], and receives results either by blocking (`*_sync`) or
//! through a callback delivered on its own [`EventLoop`].

pub mod completion;
pub mod error;
pub mod request;
pub mod response;
pub mod scheduler;

mod event_loop;
mod zone;

pub use completion::{CompletionBridge, CompletionHandle, Delivery};
pub use error::{BridgeError, ValidationError, ZoneError};
pub use event_loop::{DEFAULT_POLL_BUDGET, EventLoop};
pub use response::DecodedResponse;
pub use scheduler::{BroadcastCallback, ExecuteCallback, ZoneScheduler};
pub use zone::{Zone, ZoneInit};

pub use zone_types::{
    BroadcastResult, ExecuteRequest, ExecuteResponse, FunctionName, ResponseCode, ZoneHandle,
    ZoneSettings,
};
