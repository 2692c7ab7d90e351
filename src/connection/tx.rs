use super::{Connection, Driver};
use crate::error::DbalError;

impl<D: Driver> Connection<D> {
    /// Run `work` inside a (possibly nested) transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err` or when the
    /// commit itself fails, so the helper never leaves its level open. If that rollback
    /// fails too, the failure is logged and the earlier error is returned.
    ///
    /// # Errors
    /// Returns the error from `work`, or a `DbalError::Transaction` from begin/commit.
    pub fn transaction<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<DbalError>,
    {
        self.begin()?;
        match work(self) {
            Ok(value) => match self.commit() {
                Ok(()) => Ok(value),
                Err(commit_err) => {
                    self.rollback_quietly("rollback after failed commit failed");
                    Err(commit_err.into())
                }
            },
            Err(err) => {
                self.rollback_quietly("rollback after failed work unit failed");
                Err(err)
            }
        }
    }

    fn rollback_quietly(&mut self, message: &'static str) {
        if let Err(rollback_err) = self.rollback() {
            tracing::warn!(error = %rollback_err, "{message}");
        }
    }
}
