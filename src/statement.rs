//! Statement creation and execution on a single link.
//!
//! SQL without placeholders becomes a [`SimpleStatement`]; anything with a `?` marker
//! outside literals and comments is prepared by the driver and becomes a
//! [`PreparedStatement`].

use crate::compiler::CompiledPredicate;
use crate::connection::Link;
use crate::error::DbalError;
use crate::results::{CustomDbRow, ResultSet};
use crate::translation::count_placeholders;
use crate::types::RowValues;

/// Create a statement for `sql` on `link`. Nothing is executed.
///
/// # Errors
/// Returns `DbalError::Statement` if the driver rejects the SQL at prepare time.
pub fn create<'c, L: Link>(link: &'c mut L, sql: &str) -> Result<Statement<'c, L>, DbalError> {
    let placeholders = count_placeholders(sql);
    if placeholders == 0 {
        tracing::trace!(sql, "simple statement");
        return Ok(Statement::Simple(SimpleStatement {
            link,
            sql: sql.to_string(),
        }));
    }

    link.prepare(sql).map_err(DbalError::Statement)?;
    tracing::trace!(sql, placeholders, "prepared statement");
    Ok(Statement::Prepared(PreparedStatement {
        link,
        sql: sql.to_string(),
        slots: vec![None; placeholders],
    }))
}

/// A statement bound to the link it was created on.
pub enum Statement<'c, L: Link> {
    Simple(SimpleStatement<'c, L>),
    Prepared(PreparedStatement<'c, L>),
}

impl<'c, L: Link> Statement<'c, L> {
    #[must_use]
    pub fn sql(&self) -> &str {
        match self {
            Statement::Simple(stmt) => &stmt.sql,
            Statement::Prepared(stmt) => &stmt.sql,
        }
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        matches!(self, Statement::Prepared(_))
    }

    /// Bind `value` to the 1-based `position`.
    ///
    /// # Errors
    /// Returns `DbalError::Statement` for a simple statement or an out-of-range position.
    pub fn bind(
        &mut self,
        position: usize,
        value: impl Into<RowValues>,
    ) -> Result<&mut Self, DbalError> {
        match self {
            Statement::Simple(_) => {
                return Err(DbalError::statement(
                    "statement has no placeholders to bind",
                ));
            }
            Statement::Prepared(stmt) => {
                stmt.bind(position, value)?;
            }
        }
        Ok(self)
    }

    /// Bind values to positions `1..=n` in order.
    ///
    /// # Errors
    /// Same as [`Statement::bind`].
    pub fn bind_all<I, V>(&mut self, values: I) -> Result<&mut Self, DbalError>
    where
        I: IntoIterator<Item = V>,
        V: Into<RowValues>,
    {
        for (idx, value) in values.into_iter().enumerate() {
            self.bind(idx + 1, value)?;
        }
        Ok(self)
    }

    /// Bind the parameters of a compiled predicate.
    ///
    /// # Errors
    /// Same as [`Statement::bind`].
    pub fn bind_predicate(
        &mut self,
        predicate: &CompiledPredicate,
    ) -> Result<&mut Self, DbalError> {
        self.bind_all(predicate.params.iter().cloned())
    }

    /// Execute once, consuming the statement.
    ///
    /// # Errors
    /// Returns `DbalError::Statement` if a placeholder is unbound or the driver fails.
    pub fn execute(self) -> Result<ResultHandle, DbalError> {
        match self {
            Statement::Simple(stmt) => stmt.execute(),
            Statement::Prepared(stmt) => stmt.execute(),
        }
    }
}

/// Statement without placeholders.
pub struct SimpleStatement<'c, L: Link> {
    link: &'c mut L,
    sql: String,
}

impl<L: Link> SimpleStatement<'_, L> {
    /// # Errors
    /// Returns `DbalError::Statement` if the driver fails.
    pub fn execute(self) -> Result<ResultHandle, DbalError> {
        let result = self
            .link
            .execute(&self.sql, &[])
            .map_err(DbalError::Statement)?;
        Ok(ResultHandle { result })
    }
}

/// Statement with positional `?` placeholders.
pub struct PreparedStatement<'c, L: Link> {
    link: &'c mut L,
    sql: String,
    slots: Vec<Option<RowValues>>,
}

impl<L: Link> PreparedStatement<'_, L> {
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.slots.len()
    }

    /// # Errors
    /// Returns `DbalError::Statement` if `position` is outside `1..=placeholder_count()`.
    pub fn bind(&mut self, position: usize, value: impl Into<RowValues>) -> Result<(), DbalError> {
        let count = self.slots.len();
        let slot = position
            .checked_sub(1)
            .and_then(|idx| self.slots.get_mut(idx))
            .ok_or_else(|| {
                DbalError::statement(format!(
                    "bind position {position} out of range 1..={count}"
                ))
            })?;
        *slot = Some(value.into());
        Ok(())
    }

    /// # Errors
    /// Returns `DbalError::Statement` if a placeholder is unbound or the driver fails.
    pub fn execute(self) -> Result<ResultHandle, DbalError> {
        let mut params = Vec::with_capacity(self.slots.len());
        for (idx, slot) in self.slots.into_iter().enumerate() {
            let value = slot.ok_or_else(|| {
                DbalError::statement(format!("placeholder {} is not bound", idx + 1))
            })?;
            params.push(value);
        }
        let result = self
            .link
            .execute(&self.sql, &params)
            .map_err(DbalError::Statement)?;
        Ok(ResultHandle { result })
    }
}

/// Result of one execution. Rows are fully materialized, so the server-side cursor is
/// already released when the handle is returned; `finish` ends the lifecycle.
#[derive(Debug)]
#[must_use = "read the rows or call finish()"]
pub struct ResultHandle {
    result: ResultSet,
}

impl ResultHandle {
    #[must_use]
    pub fn rows(&self) -> &[CustomDbRow] {
        &self.result.results
    }

    #[must_use]
    pub fn rows_affected(&self) -> usize {
        self.result.rows_affected
    }

    #[must_use]
    pub fn into_result_set(self) -> ResultSet {
        self.result
    }

    pub fn finish(self) {}
}
