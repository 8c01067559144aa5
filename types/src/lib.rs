//! Core domain types for the zone execution bridge.
//!
//! Requests and responses defined here are what crosses the boundary between the
//! embedding thread and a zone scheduler. No IO, no async.

mod ids;
mod settings;

pub use ids::{ResponseCode, ZoneHandle};
pub use settings::{SettingsError, ZoneSettings};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Function Name
// ============================================================================

/// Name of the callable an execute request targets. Guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FunctionName(String);

#[derive(Debug, Error)]
#[error("function name must not be empty")]
pub struct EmptyFunctionName;

impl FunctionName {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyFunctionName> {
        let value = value.into();
        if value.is_empty() {
            Err(EmptyFunctionName)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FunctionName {
    type Error = EmptyFunctionName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for FunctionName {
    type Error = EmptyFunctionName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FunctionName> for String {
    fn from(value: FunctionName) -> Self {
        value.0
    }
}

impl std::ops::Deref for FunctionName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

// ============================================================================
// Execute Request
// ============================================================================

/// A validated call into a zone.
///
/// Construction goes through [`ExecuteRequest::new`] plus the `with_*`
/// builders; once handed to a scheduler the request is only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    /// Empty means the global scope.
    module: String,
    function: FunctionName,
    /// Each argument is an already-serialized value, positional.
    arguments: Vec<String>,
    timeout: Option<Duration>,
}

impl ExecuteRequest {
    #[must_use]
    pub fn new(function: FunctionName) -> Self {
        Self {
            module: String::new(),
            function,
            arguments: Vec::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Set the timeout in milliseconds. Zero clears it.
    #[must_use]
    pub fn with_timeout_ms(mut self, millis: u32) -> Self {
        self.timeout = (millis > 0).then(|| Duration::from_millis(u64::from(millis)));
        self
    }

    /// Module to resolve the function in. Empty for the global scope.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn function(&self) -> &FunctionName {
        &self.function
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Execution timeout; `None` means no limit.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Raw result of an execute call, as produced by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub code: ResponseCode,
    /// Empty on success.
    pub error_message: String,
    /// Serialized value; empty means no value.
    pub return_value: String,
}

impl ExecuteResponse {
    #[must_use]
    pub fn success(return_value: impl Into<String>) -> Self {
        Self {
            code: ResponseCode::SUCCESS,
            error_message: String::new(),
            return_value: return_value.into(),
        }
    }

    #[must_use]
    pub fn failure(code: ResponseCode, error_message: impl Into<String>) -> Self {
        Self {
            code,
            error_message: error_message.into(),
            return_value: String::new(),
        }
    }
}

/// Unified outcome of a broadcast across every worker in a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub code: ResponseCode,
}

impl From<ResponseCode> for BroadcastResult {
    fn from(code: ResponseCode) -> Self {
        Self { code }
    }
}
