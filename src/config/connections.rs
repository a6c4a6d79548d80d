//! Connection parameters
//!
//! The `connection` section of the worker configuration is an open map of
//! libpq-style keywords (`host`, `port`, `dbname`, `user`, `password`,
//! `sslmode`, ...). The values are passed verbatim to the handshake, except
//! `sslmode`, which is mapped onto the modes tokio-postgres knows.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Key/value connection parameters read from the `connection` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionParams(BTreeMap<String, Value>);

/// SSL connection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl SslMode {
    /// Parse a libpq `sslmode` value. Unknown values fall back to `Prefer`.
    pub fn parse(value: &str) -> Self {
        match value {
            "disable" => SslMode::Disable,
            "require" | "verify-ca" | "verify-full" => SslMode::Require,
            _ => SslMode::Prefer,
        }
    }

    /// The `sslmode` value tokio-postgres understands
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        }
    }
}

impl ConnectionParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a parameter rendered as a string, if present and scalar
    pub fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(|v| scalar_to_string(v).ok())
    }

    /// SSL mode requested by the `sslmode` parameter
    pub fn ssl_mode(&self) -> SslMode {
        self.get("sslmode")
            .map(|m| SslMode::parse(&m))
            .unwrap_or_default()
    }

    /// Build a connection string of space-separated `key=value` pairs.
    ///
    /// Values that would break the keyword/value syntax are single-quoted.
    /// `sslmode` is normalized to a mode the driver accepts; certificate
    /// verification always happens when TLS is used.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if a value is a sequence or a map.
    pub fn connection_string(&self) -> ConfigResult<String> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (key, value) in &self.0 {
            let value = scalar_to_string(value).map_err(|kind| {
                ConfigError::Invalid(format!(
                    "connection parameter '{}' must be a scalar, got {}",
                    key, kind
                ))
            })?;
            let value = if key == "sslmode" {
                SslMode::parse(&value).as_str().to_string()
            } else {
                value
            };
            pairs.push(format!("{}={}", key, quote_value(&value)));
        }
        Ok(pairs.join(" "))
    }

    /// Short `dbname@host` label for log lines (never includes the password)
    pub fn describe(&self) -> String {
        let db = self.get("dbname").unwrap_or_else(|| "?".to_string());
        let host = self.get("host").unwrap_or_else(|| "localhost".to_string());
        format!("{}@{}", db, host)
    }
}

fn scalar_to_string(value: &Value) -> Result<String, &'static str> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Sequence(_) => Err("a sequence"),
        Value::Mapping(_) => Err("a mapping"),
        Value::Tagged(_) => Err("a tagged value"),
    }
}

/// Quote a value the way libpq keyword/value strings expect
fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}
