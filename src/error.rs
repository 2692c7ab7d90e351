use std::fmt;

use thiserror::Error;

/// Failure reported by a driver, normalized to message + code.
///
/// Every backend error is converted into this type at the driver boundary, so no
/// driver-native error escapes the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub message: String,
    /// SQLSTATE for Postgres, extended result code for `SQLite`.
    pub code: Option<String>,
}

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} (code {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DriverError {}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error() {
            Some(ffi_err) => {
                DriverError::with_code(err.to_string(), ffi_err.extended_code.to_string())
            }
            None => DriverError::new(err.to_string()),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for DriverError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(state) => DriverError::with_code(err.to_string(), state.code()),
            None => DriverError::new(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbalError {
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Statement error: {0}")]
    Statement(#[source] DriverError),

    #[error("Transaction error: {message}")]
    Transaction {
        message: String,
        #[source]
        source: Option<DriverError>,
    },

    #[error("Connection error: {0}")]
    Connection(#[source] DriverError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task error: {0}")]
    Task(String),
}

impl DbalError {
    pub(crate) fn statement(message: impl Into<String>) -> Self {
        DbalError::Statement(DriverError::new(message))
    }

    pub(crate) fn transaction(message: impl Into<String>) -> Self {
        DbalError::Transaction {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn transaction_failed(message: impl Into<String>, source: DriverError) -> Self {
        DbalError::Transaction {
            message: message.into(),
            source: Some(source),
        }
    }

    pub(crate) fn disconnected() -> Self {
        DbalError::Connection(DriverError::new("connection is not established"))
    }

    /// Driver code carried by the error, if any.
    #[must_use]
    pub fn driver_code(&self) -> Option<&str> {
        match self {
            DbalError::Statement(err) | DbalError::Connection(err) => err.code.as_deref(),
            DbalError::Transaction {
                source: Some(err), ..
            } => err.code.as_deref(),
            _ => None,
        }
    }
}
