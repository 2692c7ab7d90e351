//! rusqlite-backed driver.
//!
//! Parameters: `path` (defaults to `:memory:`), `mode` (`ro` opens read-only),
//! `busy_timeout_ms`.

mod params;
mod query;

use std::time::Duration;

use rusqlite::OpenFlags;

use crate::connection::{ConnectionParams, Driver, DriverOptions, Link};
use crate::error::DriverError;
use crate::results::ResultSet;
use crate::types::RowValues;

pub use params::row_value_to_sqlite_value;
pub use query::build_result_set;

pub const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    type Link = SqliteLink;

    fn connect(
        &self,
        params: &ConnectionParams,
        options: &DriverOptions,
    ) -> Result<SqliteLink, DriverError> {
        let path = params.get("path").map_or(MEMORY_PATH, String::as_str);
        let conn = if path == MEMORY_PATH {
            rusqlite::Connection::open_in_memory()?
        } else {
            let flags = match params.get("mode").map(String::as_str) {
                Some("ro") => OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
                _ => OpenFlags::default(),
            };
            rusqlite::Connection::open_with_flags(path, flags)?
        };

        if let Some(ms) = params.get("busy_timeout_ms") {
            let ms: u64 = ms.parse().map_err(|_| {
                DriverError::new(format!("busy_timeout_ms must be an integer, got `{ms}`"))
            })?;
            conn.busy_timeout(Duration::from_millis(ms))?;
        }

        tracing::debug!(path, "sqlite link opened");
        Ok(SqliteLink {
            conn,
            options: *options,
        })
    }
}

/// Physical `SQLite` link.
pub struct SqliteLink {
    conn: rusqlite::Connection,
    options: DriverOptions,
}

impl SqliteLink {
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Link for SqliteLink {
    fn ping(&mut self) -> bool {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }

    fn prepare(&mut self, sql: &str) -> Result<(), DriverError> {
        self.conn.prepare(sql)?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, DriverError> {
        let values: Vec<rusqlite::types::Value> =
            params.iter().map(row_value_to_sqlite_value).collect();
        let mut stmt = self.conn.prepare(sql)?;
        if stmt.column_count() == 0 {
            let changed = stmt.execute(rusqlite::params_from_iter(values.iter()))?;
            Ok(ResultSet::affected(changed))
        } else {
            build_result_set(&mut stmt, &values, &self.options)
        }
    }

    fn begin(&mut self) -> Result<(), DriverError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn close(self) -> Result<(), DriverError> {
        self.conn.close().map_err(|(_, err)| DriverError::from(err))
    }
}
