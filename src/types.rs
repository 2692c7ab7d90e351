use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Values used as bound parameters and returned in result rows.
///
/// The same enum is shared by the compiler and every driver:
/// ```rust
/// use sql_dbal::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("active".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Render the value as text, as the driver would with stringified fetches.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            RowValues::Int(i) => Some(i.to_string()),
            RowValues::Float(f) => Some(f.to_string()),
            RowValues::Text(s) => Some(s.clone()),
            RowValues::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            RowValues::Timestamp(dt) => Some(dt.format("%F %T%.f").to_string()),
            RowValues::Null => None,
            RowValues::JSON(v) => Some(v.to_string()),
            RowValues::Blob(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Map a scalar JSON value. Arrays and objects are kept as `JSON`.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => RowValues::Null,
            JsonValue::Bool(b) => RowValues::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => RowValues::Int(i),
                None => RowValues::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => RowValues::Text(s.clone()),
            other => RowValues::JSON(other.clone()),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::Float(f) => JsonValue::from(*f),
            RowValues::Text(s) => JsonValue::from(s.as_str()),
            RowValues::Bool(b) => JsonValue::from(*b),
            RowValues::Timestamp(dt) => JsonValue::from(dt.format("%F %T%.f").to_string()),
            RowValues::Null => JsonValue::Null,
            RowValues::JSON(v) => v.clone(),
            RowValues::Blob(bytes) => {
                JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
            }
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}
