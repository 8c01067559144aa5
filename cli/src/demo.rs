//! Native functions registered on the CLI's scheduler.

use std::time::Duration;

use zone_local::FunctionRegistry;

/// Longest `demo.sleep` accepts, in milliseconds.
const MAX_SLEEP_MS: u64 = 60_000;

pub fn registry() -> FunctionRegistry {
    FunctionRegistry::new()
        .register("", "echo", echo_all)
        .register("demo", "echo", echo_first)
        .register("demo", "add", add)
        .register("demo", "sleep", sleep)
        .on_broadcast(|source| {
            tracing::info!(bytes = source.len(), "Broadcast received");
            Ok(())
        })
}

/// All arguments as a JSON array of their serialized text.
fn echo_all(args: &[String]) -> Result<String, String> {
    serde_json::to_string(args).map_err(|e| e.to_string())
}

fn echo_first(args: &[String]) -> Result<String, String> {
    Ok(args.first().cloned().unwrap_or_default())
}

/// Sum of numeric arguments. Integer if every argument is an integer.
fn add(args: &[String]) -> Result<String, String> {
    let numbers = args
        .iter()
        .map(|arg| match serde_json::from_str::<serde_json::Value>(arg) {
            Ok(serde_json::Value::Number(n)) => Ok(n),
            _ => Err(format!("'{arg}' is not a number")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(ints) = numbers.iter().map(serde_json::Number::as_i64).collect::<Option<Vec<_>>>() {
        return ints
            .into_iter()
            .try_fold(0_i64, i64::checked_add)
            .map(|sum| sum.to_string())
            .ok_or_else(|| "integer overflow".to_string());
    }

    let sum: f64 = numbers.iter().filter_map(serde_json::Number::as_f64).sum();
    serde_json::Number::from_f64(sum)
        .map(|n| n.to_string())
        .ok_or_else(|| "sum is not finite".to_string())
}

/// Sleep for the first argument's milliseconds and return it.
fn sleep(args: &[String]) -> Result<String, String> {
    let millis = args
        .first()
        .and_then(|arg| arg.parse::<u64>().ok())
        .filter(|ms| *ms <= MAX_SLEEP_MS)
        .ok_or_else(|| format!("expected a duration of at most {MAX_SLEEP_MS} ms"))?;
    std::thread::sleep(Duration::from_millis(millis));
    Ok(millis.to_string())
}
