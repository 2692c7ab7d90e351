use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::driver::ConnectionParams;
use crate::error::DbalError;

/// Connection parameters plus the statements replayed after every (re)connect.
///
/// Both are fixed once the config is built.
///
/// ```rust
/// use sql_dbal::prelude::*;
///
/// let config = ConnectionConfig::from_json_str(r#"{
///     "connectionParameters": {"path": ":memory:"},
///     "bootstrapStatements": ["PRAGMA foreign_keys = ON"]
/// }"#)?;
/// assert_eq!(config.param("path"), Some(":memory:"));
/// assert_eq!(config.bootstrap().len(), 1);
/// # Ok::<(), DbalError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(
        default,
        alias = "connectionParameters",
        deserialize_with = "deserialize_params"
    )]
    params: ConnectionParams,
    #[serde(default, alias = "bootstrapStatements")]
    bootstrap: Vec<String>,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(params: ConnectionParams, bootstrap: Vec<String>) -> Self {
        Self { params, bootstrap }
    }

    #[must_use]
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Parse a JSON config document.
    ///
    /// # Errors
    /// Returns `DbalError::Config` if the document is not a valid config.
    pub fn from_json_str(json: &str) -> Result<Self, DbalError> {
        serde_json::from_str(json)
            .map_err(|e| DbalError::Config(format!("invalid connection config: {e}")))
    }

    #[must_use]
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn bootstrap(&self) -> &[String] {
        &self.bootstrap
    }
}

/// Fluent builder for [`ConnectionConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.params.insert(key.into(), value.into());
        self
    }

    /// Append a statement to run after every successful connect.
    #[must_use]
    pub fn bootstrap(mut self, sql: impl Into<String>) -> Self {
        self.config.bootstrap.push(sql.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionConfig {
        self.config
    }
}

// Scalars are accepted so `"port": 5432` works alongside `"port": "5432"`.
fn deserialize_params<'de, D>(deserializer: D) -> Result<ConnectionParams, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = std::collections::BTreeMap::<String, JsonValue>::deserialize(deserializer)?;
    let mut params = ConnectionParams::new();
    for (key, value) in raw {
        let text = match value {
            JsonValue::String(s) => s,
            JsonValue::Number(n) => n.to_string(),
            JsonValue::Bool(b) => b.to_string(),
            JsonValue::Null => continue,
            other => {
                return Err(de::Error::custom(format!(
                    "connection parameter `{key}` must be a scalar, got {other}"
                )));
            }
        };
        params.insert(key, text);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_params_and_bootstrap() {
        let config = ConnectionConfig::builder()
            .param("host", "localhost")
            .param("port", "5432")
            .bootstrap("SET TIME ZONE 'UTC'")
            .bootstrap("SET search_path TO shop")
            .finish();

        assert_eq!(config.param("host"), Some("localhost"));
        assert_eq!(
            config.bootstrap(),
            ["SET TIME ZONE 'UTC'", "SET search_path TO shop"]
        );
    }

    #[test]
    fn json_accepts_short_and_long_keys() {
        let long = ConnectionConfig::from_json_str(
            r#"{"connectionParameters": {"port": 5432, "ssl": false, "unused": null}}"#,
        )
        .unwrap();
        assert_eq!(long.param("port"), Some("5432"));
        assert_eq!(long.param("ssl"), Some("false"));
        assert_eq!(long.param("unused"), None);
        assert!(long.bootstrap().is_empty());

        let short = ConnectionConfig::from_json_str(
            r#"{"params": {"path": "a.db"}, "bootstrap": ["SELECT 1"]}"#,
        )
        .unwrap();
        assert_eq!(short.param("path"), Some("a.db"));
        assert_eq!(short.bootstrap(), ["SELECT 1"]);
    }

    #[test]
    fn rejects_nested_parameter_values() {
        let err = ConnectionConfig::from_json_str(r#"{"params": {"host": ["a", "b"]}}"#)
            .unwrap_err();
        assert!(matches!(err, DbalError::Config(ref msg) if msg.contains("host")));
    }
}
