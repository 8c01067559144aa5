//! Zone settings and their flattened command-line form.
//!
//! A zone is created from an ordered list of key/value pairs. The scheduler
//! receives them as a single string of ` --key value` tokens, in input order.
//! Duplicate keys are kept; what a repeat means is up to the scheduler's
//! argument parser.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("zone settings must be an object")]
    NotAnObject,
    #[error("zone setting '{key}' must be a string, number or boolean")]
    UnsupportedValue { key: String },
}

/// Ordered zone settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSettings {
    entries: Vec<(String, String)>,
}

impl ZoneSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a setting. Existing entries with the same key are kept.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Build settings from a JSON object.
    ///
    /// Strings are taken verbatim; numbers and booleans use their JSON text.
    /// Entries keep the object's key order.
    pub fn from_json(value: &Value) -> Result<Self, SettingsError> {
        let Value::Object(map) = value else {
            return Err(SettingsError::NotAnObject);
        };

        let mut entries = Vec::with_capacity(map.len());
        for (key, val) in map {
            let rendered = match val {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(SettingsError::UnsupportedValue { key: key.clone() });
                }
            };
            entries.push((key.clone(), rendered));
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as the scheduler config string: ` --key value` per entry.
    #[must_use]
    pub fn to_config_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(" --");
            out.push_str(key);
            out.push(' ');
            out.push_str(value);
        }
        out
    }
}

impl<K, V> FromIterator<(K, V)> for ZoneSettings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
