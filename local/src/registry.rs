//! Native functions a [`LocalScheduler`](crate::LocalScheduler) can execute.
//!
//! Functions take the request's serialized arguments and return a serialized
//! value, or an error message.

use std::collections::HashMap;
use std::sync::Arc;

pub type NativeFunction = Arc<dyn Fn(&[String]) -> Result<String, String> + Send + Sync>;

pub type BroadcastHandler = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// Functions keyed by `(module, function)`. The empty module is the global scope.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<(String, String), NativeFunction>,
    broadcast: Option<BroadcastHandler>,
}

impl FunctionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `module`/`function`, replacing any earlier entry.
    #[must_use]
    pub fn register<F>(mut self, module: &str, function: &str, f: F) -> Self
    where
        F: Fn(&[String]) -> Result<String, String> + Send + Sync + 'static,
    {
        let key = (module.to_string(), function.to_string());
        if self.functions.insert(key, Arc::new(f)).is_some() {
            tracing::warn!(module, function, "Replacing registered function");
        }
        self
    }

    /// Handler run once per worker for each broadcast.
    #[must_use]
    pub fn on_broadcast<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.broadcast = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn lookup(&self, module: &str, function: &str) -> Option<NativeFunction> {
        self.functions
            .get(&(module.to_string(), function.to_string()))
            .cloned()
    }

    #[must_use]
    pub fn broadcast_handler(&self) -> Option<BroadcastHandler> {
        self.broadcast.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self
            .functions
            .keys()
            .map(|(module, function)| {
                if module.is_empty() {
                    function.clone()
                } else {
                    format!("{module}.{function}")
                }
            })
            .collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .field("broadcast", &self.broadcast.is_some())
            .finish()
    }
}
