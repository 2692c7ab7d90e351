use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, index_columns};
use crate::types::RowValues;

/// Materialized result of one statement execution.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    /// Rows changed by a DML statement, or rows returned by a query
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Result of a statement that returns no rows.
    #[must_use]
    pub fn affected(rows_affected: usize) -> ResultSet {
        ResultSet {
            rows_affected,
            ..ResultSet::default()
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Arc::new(index_columns(&column_names));
        self.column_names = Some(column_names);
    }

    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row; ignored until column names are set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let Some(column_names) = &self.column_names {
            self.results.push(CustomDbRow {
                column_names: Arc::clone(column_names),
                rows: row_values,
                column_index_cache: Arc::clone(&self.column_index),
            });
            self.rows_affected += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_column_lookup() {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_column_names(Arc::new(vec!["id".into(), "status".into()]));
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("active".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Null]);

        assert_eq!(rs.len(), 2);
        assert_eq!(rs.rows_affected, 2);
        assert_eq!(rs.results[0].get("status").and_then(|v| v.as_text()), Some("active"));
        assert!(rs.results[1].get("status").is_some_and(RowValues::is_null));
        assert!(rs.results[1].get("missing").is_none());
    }

    #[test]
    fn rows_without_columns_are_dropped() {
        let mut rs = ResultSet::default();
        rs.add_row_values(vec![RowValues::Int(1)]);
        assert!(rs.is_empty());
    }
}
