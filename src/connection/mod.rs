//! A single physical link with reconnect, bootstrap replay and reference-counted
//! transactions.
//!
//! `begin`/`commit`/`rollback` nest logically: only the outermost `begin` starts a
//! server transaction and only the matching outermost `commit`/`rollback` ends it.
//!
//! ```rust
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), sql_dbal::DbalError> {
//! use sql_dbal::prelude::*;
//!
//! let config = ConnectionConfig::builder().param("path", ":memory:").finish();
//! let mut conn = Connection::open(SqliteDriver, config)?;
//!
//! conn.begin()?;
//! conn.begin()?; // logical only
//! conn.commit()?; // logical only
//! assert!(conn.in_transaction());
//! conn.commit()?; // physical commit
//! assert!(!conn.in_transaction());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```

mod config;
mod driver;
mod tx;

pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use driver::{ColumnCase, ConnectionParams, Driver, DriverOptions, Link, NullHandling};

use crate::error::{DbalError, DriverError};
use crate::statement::{self, Statement};

/// Owns one physical link. Not meant for concurrent use; give each worker its own.
pub struct Connection<D: Driver> {
    driver: D,
    config: ConnectionConfig,
    options: DriverOptions,
    link: Option<D::Link>,
    depth: usize,
}

impl<D: Driver> Connection<D> {
    /// Create a disconnected connection.
    #[must_use]
    pub fn new(driver: D, config: ConnectionConfig) -> Self {
        Self {
            driver,
            config,
            options: DriverOptions::fixed(),
            link: None,
            depth: 0,
        }
    }

    /// Create and connect.
    ///
    /// # Errors
    /// Same as [`Connection::connect`].
    pub fn open(driver: D, config: ConnectionConfig) -> Result<Self, DbalError> {
        let mut conn = Self::new(driver, config);
        conn.connect()?;
        Ok(conn)
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Current logical transaction depth.
    #[must_use]
    pub fn transaction_depth(&self) -> usize {
        self.depth
    }

    /// Connect, or reconnect if the current link no longer answers a ping.
    ///
    /// A live link is kept as is. A new link gets the bootstrap statements replayed in
    /// order and replaces the old one only once all of them succeeded; the transaction
    /// depth is reset to 0.
    ///
    /// # Errors
    /// Returns `DbalError::Connection` if the link cannot be established or a bootstrap
    /// statement fails. The previous state is kept in that case.
    pub fn connect(&mut self) -> Result<(), DbalError> {
        if let Some(link) = self.link.as_mut()
            && link.ping()
        {
            tracing::trace!("link alive, reusing");
            return Ok(());
        }

        let reconnect = self.link.is_some();
        let mut link = self
            .driver
            .connect(self.config.params(), &self.options)
            .map_err(DbalError::Connection)?;

        for sql in self.config.bootstrap() {
            run_bootstrap(&mut link, sql)?;
        }

        if self.depth > 0 {
            tracing::warn!(
                depth = self.depth,
                "reconnect discarded an open transaction"
            );
        }
        self.link = Some(link);
        self.depth = 0;
        tracing::debug!(
            reconnect,
            bootstrap = self.config.bootstrap().len(),
            "connection established"
        );
        Ok(())
    }

    /// Create a statement; see [`statement::create`].
    ///
    /// # Errors
    /// Returns `DbalError::Connection` when disconnected, `DbalError::Statement` if the
    /// driver rejects the SQL.
    pub fn create(&mut self, sql: &str) -> Result<Statement<'_, D::Link>, DbalError> {
        let link = self.link.as_mut().ok_or_else(DbalError::disconnected)?;
        statement::create(link, sql)
    }

    /// Start a (possibly nested) transaction.
    ///
    /// # Errors
    /// Returns `DbalError::Transaction` if the server refuses to start one; the depth is
    /// unchanged then.
    pub fn begin(&mut self) -> Result<(), DbalError> {
        let link = self.link.as_mut().ok_or_else(DbalError::disconnected)?;
        if self.depth == 0 {
            link.begin()
                .map_err(|e| DbalError::transaction_failed("unable to start new transaction", e))?;
            tracing::debug!("transaction started");
        }
        self.depth += 1;
        tracing::trace!(depth = self.depth, "begin");
        Ok(())
    }

    /// Commit one nesting level; the outermost level commits on the server.
    ///
    /// # Errors
    /// Returns `DbalError::Transaction` when no transaction is open or the server commit
    /// fails; the depth is unchanged then.
    pub fn commit(&mut self) -> Result<(), DbalError> {
        let link = self.link.as_mut().ok_or_else(DbalError::disconnected)?;
        match self.depth {
            0 => Err(DbalError::transaction(
                "commit called without an open transaction",
            )),
            1 => {
                link.commit()
                    .map_err(|e| DbalError::transaction_failed("failed to commit transaction", e))?;
                self.depth = 0;
                tracing::debug!("transaction committed");
                Ok(())
            }
            _ => {
                self.depth -= 1;
                tracing::trace!(depth = self.depth, "commit (nested)");
                Ok(())
            }
        }
    }

    /// Roll back one nesting level; the outermost level rolls back on the server.
    ///
    /// Inner rollbacks only decrement the depth, so the work stays pending until the
    /// outermost call decides.
    ///
    /// # Errors
    /// Returns `DbalError::Transaction` when no transaction is open or the server
    /// rollback fails; the depth is unchanged then.
    pub fn rollback(&mut self) -> Result<(), DbalError> {
        let link = self.link.as_mut().ok_or_else(DbalError::disconnected)?;
        match self.depth {
            0 => Err(DbalError::transaction(
                "rollback called without an open transaction",
            )),
            1 => {
                link.rollback().map_err(|e| {
                    DbalError::transaction_failed("failed to roll back transaction", e)
                })?;
                self.depth = 0;
                tracing::debug!("transaction rolled back");
                Ok(())
            }
            _ => {
                self.depth -= 1;
                tracing::trace!(depth = self.depth, "rollback (nested)");
                Ok(())
            }
        }
    }

    /// Whether a logical transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        let logical = self.depth > 0;
        if let Some(link) = &self.link {
            let physical = link.in_transaction();
            if physical != logical {
                tracing::warn!(
                    depth = self.depth,
                    physical,
                    "transaction depth disagrees with driver state"
                );
            }
        }
        logical
    }

    /// Roll back any open transaction and release the link. Closing twice is a no-op.
    ///
    /// # Errors
    /// Returns `DbalError::Transaction` if the forced rollback fails, or
    /// `DbalError::Connection` if the driver fails to close. The link is released either
    /// way.
    pub fn close(&mut self) -> Result<(), DbalError> {
        let Some(mut link) = self.link.take() else {
            return Ok(());
        };

        let rolled_back = if self.depth > 0 {
            tracing::debug!(depth = self.depth, "rolling back open transaction on close");
            self.depth = 0;
            link.rollback().map_err(|e| {
                DbalError::transaction_failed("failed to roll back transaction on close", e)
            })
        } else {
            Ok(())
        };

        let closed = link.close().map_err(DbalError::Connection);
        match (rolled_back, closed) {
            (Err(rollback_err), Err(close_err)) => {
                tracing::warn!(error = %close_err, "closing link failed after rollback failure");
                Err(rollback_err)
            }
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
            (Ok(()), Ok(())) => {
                tracing::debug!("connection closed");
                Ok(())
            }
        }
    }

    /// Direct access to the physical link.
    pub fn raw_link(&mut self) -> Option<&mut D::Link> {
        self.link.as_mut()
    }
}

impl<D: Driver> Drop for Connection<D> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(error = %err, "closing connection on drop failed");
        }
    }
}

fn run_bootstrap<L: Link>(link: &mut L, sql: &str) -> Result<(), DbalError> {
    let result = statement::create(link, sql).and_then(Statement::execute);
    match result {
        Ok(handle) => {
            handle.finish();
            Ok(())
        }
        Err(DbalError::Statement(err)) => Err(DbalError::Connection(DriverError {
            message: format!("bootstrap statement `{sql}` failed: {}", err.message),
            code: err.code,
        })),
        Err(other) => Err(other),
    }
}
