//! SQL literal values
//!
//! Values passed to the insert helpers are rendered as SQL literals, so text
//! is always quoted and escaped instead of pasted into the statement.

use chrono::{DateTime, SecondsFormat, Utc};

/// A value to be written into an INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Rendered as an ISO 8601 string literal
    Timestamp(DateTime<Utc>),
    /// Trusted SQL expression inserted verbatim, e.g. `now()` or `DEFAULT`
    Raw(String),
}

impl SqlValue {
    /// Render this value as a SQL literal
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) if f.is_finite() => f.to_string(),
            // NaN and infinities only exist as quoted float input
            SqlValue::Float(f) => quote(&f.to_string()),
            SqlValue::Text(s) => quote(s),
            SqlValue::Timestamp(ts) => quote(&iso_8601(ts)),
            SqlValue::Raw(expr) => expr.clone(),
        }
    }

    /// Interpret a command-line argument as a literal.
    ///
    /// `null`, `true` and `false` (any case), integers and floats map to
    /// their types; anything else is text.
    pub fn parse_literal(input: &str) -> Self {
        match input.to_ascii_lowercase().as_str() {
            "null" => return SqlValue::Null,
            "true" => return SqlValue::Bool(true),
            "false" => return SqlValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = input.parse::<i64>() {
            return SqlValue::Int(i);
        }
        match input.parse::<f64>() {
            Ok(f) if f.is_finite() => SqlValue::Float(f),
            _ => SqlValue::Text(input.to_string()),
        }
    }
}

/// Format a timestamp the way it is written into statements
pub fn iso_8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                SqlValue::Int(v as i64)
            }
        })*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}
