//! Task submission.
//!
//! [`SerialRunner`] runs every task immediately on the caller's thread; a pooled runner
//! would implement the same [`TaskRunner`] contract.

use crate::error::DbalError;

/// Submit units of work and wait for them.
pub trait TaskRunner {
    /// Whether tasks actually run in parallel.
    fn is_available(&self) -> bool;

    /// Run `task` with `args`. With `restart`, a failed task is started once more.
    ///
    /// # Errors
    /// Returns `DbalError::Task` if the task (and its restart) failed.
    fn start<A, F>(&mut self, task: F, args: A, restart: bool) -> Result<&mut Self, DbalError>
    where
        A: Clone + Send + 'static,
        F: Fn(A) -> Result<(), DbalError> + Send + 'static;

    /// Block until every started task has finished.
    ///
    /// # Errors
    /// Returns `DbalError::Task` if a task failed.
    fn wait(&mut self) -> Result<&mut Self, DbalError>;
}

/// Runs tasks inline, in submission order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialRunner;

impl TaskRunner for SerialRunner {
    fn is_available(&self) -> bool {
        false
    }

    fn start<A, F>(&mut self, task: F, args: A, restart: bool) -> Result<&mut Self, DbalError>
    where
        A: Clone + Send + 'static,
        F: Fn(A) -> Result<(), DbalError> + Send + 'static,
    {
        let outcome = match task(args.clone()) {
            Err(err) if restart => {
                tracing::debug!(error = %err, "task failed, restarting once");
                task(args)
            }
            other => other,
        };
        outcome.map_err(|err| DbalError::Task(err.to_string()))?;
        Ok(self)
    }

    fn wait(&mut self) -> Result<&mut Self, DbalError> {
        Ok(self)
    }
}
