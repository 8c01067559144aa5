//! Error taxonomy for the bridge.
//!
//! Only two kinds of failure are raised as errors: malformed input
//! ([`ValidationError`]) and zone lookup/creation failures ([`ZoneError`]).
//! A nonzero scheduler code is completion data, not an error.

use zone_types::SettingsError;

/// The input object could not be turned into a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("execution request must be an object")]
    NotAnObject,
    #[error("function property is missing or not a string")]
    MissingFunction,
    #[error("function property must not be empty")]
    EmptyFunction,
    #[error("module property must be a string")]
    InvalidModule,
    #[error("arguments property must be an array")]
    InvalidArguments,
    #[error("timeout property must be a non-negative integer of at most {max} milliseconds", max = u32::MAX)]
    InvalidTimeout,
    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),
}

/// Failure reported by a scheduler while binding a zone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    #[error("zone '{id}' not found")]
    NotFound { id: String },
    #[error("zone '{id}' already exists")]
    AlreadyExists { id: String },
    #[error("invalid configuration for zone '{id}': {message}")]
    InvalidConfig { id: String, message: String },
    #[error("failed to create zone '{id}': {message}")]
    CreateFailed { id: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Zone(#[from] ZoneError),
}
