//! Parser for the flattened ` --key value` zone configuration string.

/// Default number of worker threads per zone.
pub const DEFAULT_WORKERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigParseError {
    #[error("expected an option starting with '--', found '{0}'")]
    UnexpectedToken(String),
    #[error("option '--{0}' has no value")]
    MissingValue(String),
    #[error("option '--{key}' has invalid value '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Settings [`LocalScheduler`](crate::LocalScheduler) understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalZoneConfig {
    workers: usize,
}

impl Default for LocalZoneConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl LocalZoneConfig {
    /// Parse ` --key value` pairs. A repeated key overrides the earlier one.
    pub fn parse(config: &str) -> Result<Self, ConfigParseError> {
        let mut parsed = Self::default();
        let mut tokens = config.split_whitespace();

        while let Some(token) = tokens.next() {
            let Some(key) = token.strip_prefix("--").filter(|k| !k.is_empty()) else {
                return Err(ConfigParseError::UnexpectedToken(token.to_string()));
            };
            let Some(value) = tokens.next() else {
                return Err(ConfigParseError::MissingValue(key.to_string()));
            };

            match key {
                "workers" => {
                    parsed.workers = value
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ConfigParseError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        })?;
                }
                other => {
                    tracing::debug!(key = other, value, "Ignoring unknown zone setting");
                }
            }
        }

        Ok(parsed)
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }
}
