//! Request codec: loosely-typed input object to [`ExecuteRequest`].
//!
//! `function` is the only mandatory key. `module`, `arguments` and `timeout`
//! may be absent; a `null` value counts as absent. Nothing here touches a
//! scheduler, so every rejection happens before any work is handed off.

use serde_json::{Map, Value};
use zone_types::{ExecuteRequest, FunctionName};

use crate::error::ValidationError;

/// Build a validated request from an input object.
pub fn build(input: &Value) -> Result<ExecuteRequest, ValidationError> {
    let result = input
        .as_object()
        .ok_or(ValidationError::NotAnObject)
        .and_then(build_from_object);
    if let Err(e) = &result {
        tracing::debug!(error = %e, "Rejected execution request");
    }
    result
}

fn build_from_object(obj: &Map<String, Value>) -> Result<ExecuteRequest, ValidationError> {
    let function = match obj.get("function") {
        Some(Value::String(name)) => {
            FunctionName::new(name.as_str()).map_err(|_| ValidationError::EmptyFunction)?
        }
        _ => return Err(ValidationError::MissingFunction),
    };

    let mut request = ExecuteRequest::new(function);

    if let Some(module) = present(obj, "module") {
        request = request.with_module(module_string(module)?);
    }

    if let Some(arguments) = present(obj, "arguments") {
        let Value::Array(items) = arguments else {
            return Err(ValidationError::InvalidArguments);
        };
        request = request.with_arguments(items.iter().map(argument_string).collect());
    }

    if let Some(timeout) = present(obj, "timeout") {
        let millis = timeout
            .as_u64()
            .and_then(|ms| u32::try_from(ms).ok())
            .ok_or(ValidationError::InvalidTimeout)?;
        request = request.with_timeout_ms(millis);
    }

    Ok(request)
}

/// Look up an optional key, folding `null` into "absent".
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn module_string(value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(ValidationError::InvalidModule),
    }
}

/// Strings are already serialized; anything else is rendered as JSON text.
fn argument_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
