use std::collections::BTreeMap;

use crate::error::DriverError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Driver-specific connection parameters (host, credentials, schema, path, ...).
pub type ConnectionParams = BTreeMap<String, String>;

/// How column names are reported in result sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCase {
    Natural,
    Lower,
    Upper,
}

/// How empty strings fetched from the server are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullHandling {
    /// NULL stays NULL, empty strings stay empty strings.
    Natural,
    /// Empty strings are reported as NULL.
    EmptyStringAsNull,
}

/// Options every driver applies when it opens a link and builds result sets.
///
/// Failures are always reported as errors; there is no silent mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    pub case: ColumnCase,
    pub nulls: NullHandling,
    pub stringify_fetches: bool,
}

impl DriverOptions {
    /// The options [`Connection`](crate::connection::Connection) always connects with:
    /// natural column case, natural NULLs, typed (non-stringified) fetch results.
    #[must_use]
    pub const fn fixed() -> Self {
        Self {
            case: ColumnCase::Natural,
            nulls: NullHandling::Natural,
            stringify_fetches: false,
        }
    }

    #[must_use]
    pub fn column_name(&self, name: &str) -> String {
        match self.case {
            ColumnCase::Natural => name.to_string(),
            ColumnCase::Lower => name.to_lowercase(),
            ColumnCase::Upper => name.to_uppercase(),
        }
    }

    #[must_use]
    pub fn value(&self, value: RowValues) -> RowValues {
        let value = match (self.nulls, value) {
            (NullHandling::EmptyStringAsNull, RowValues::Text(s)) if s.is_empty() => {
                RowValues::Null
            }
            (_, value) => value,
        };
        if self.stringify_fetches {
            value.to_text().map_or(RowValues::Null, RowValues::Text)
        } else {
            value
        }
    }
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self::fixed()
    }
}

/// Opens physical links to a database.
pub trait Driver {
    type Link: Link;

    /// Establish a new physical link.
    ///
    /// # Errors
    /// Returns the driver's failure, normalized to [`DriverError`].
    fn connect(
        &self,
        params: &ConnectionParams,
        options: &DriverOptions,
    ) -> Result<Self::Link, DriverError>;
}

/// One physical link. The transaction calls map directly to the server; nesting is
/// handled by [`Connection`](crate::connection::Connection).
pub trait Link {
    /// Cheap liveness probe.
    fn ping(&mut self) -> bool;

    /// Validate `sql` without executing it. Placeholders are bare `?` markers.
    ///
    /// # Errors
    /// Returns the driver's failure, e.g. a syntax error.
    fn prepare(&mut self, sql: &str) -> Result<(), DriverError>;

    /// Execute `sql` with positional parameters and materialize the result.
    ///
    /// # Errors
    /// Returns the driver's failure.
    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, DriverError>;

    /// # Errors
    /// Returns the driver's failure.
    fn begin(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns the driver's failure.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns the driver's failure.
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// The driver's own view of whether a transaction is open.
    fn in_transaction(&self) -> bool;

    /// Release the link.
    ///
    /// # Errors
    /// Returns the driver's failure.
    fn close(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_options_keep_values_untouched() {
        let opts = DriverOptions::fixed();
        assert_eq!(opts.column_name("OrderId"), "OrderId");
        assert_eq!(opts.value(RowValues::Int(3)), RowValues::Int(3));
        assert_eq!(opts.value(RowValues::Text(String::new())), RowValues::Text(String::new()));
    }

    #[test]
    fn alternative_options_transform_values() {
        let opts = DriverOptions {
            case: ColumnCase::Lower,
            nulls: NullHandling::EmptyStringAsNull,
            stringify_fetches: true,
        };
        assert_eq!(opts.column_name("OrderId"), "orderid");
        assert_eq!(opts.value(RowValues::Int(3)), RowValues::Text("3".into()));
        assert_eq!(opts.value(RowValues::Text(String::new())), RowValues::Null);
    }
}
