use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Statement, ToSql};

use crate::connection::DriverOptions;
use crate::error::DriverError;
use crate::results::ResultSet;
use crate::types::RowValues;

fn extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, DriverError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a row-returning statement and materialize the rows.
///
/// # Errors
/// Returns the driver failure from execution or value extraction.
pub fn build_result_set(
    stmt: &mut Statement,
    params: &[Value],
    options: &DriverOptions,
) -> Result<ResultSet, DriverError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|name| options.column_name(name))
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows_iter = stmt.query(&param_refs[..])?;
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(options.value(extract_value(row, i)?));
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
