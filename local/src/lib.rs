//! In-process [`ZoneScheduler`](zone_bridge::ZoneScheduler) backed by tokio runtimes.
//!
//! Zones are configured with the same flattened ` --key value` string the
//! bridge produces from a settings object. Work is a table of native Rust
//! functions registered up front in a [`FunctionRegistry`].

pub mod codes;
mod config;
mod registry;
mod scheduler;

pub use config::{ConfigParseError, DEFAULT_WORKERS, LocalZoneConfig};
pub use registry::{BroadcastHandler, FunctionRegistry, NativeFunction};
pub use scheduler::LocalScheduler;
