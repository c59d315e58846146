//! Cancellation and deadline control for migration runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{MigrateError, MigrateResult};

/// Cancellation/deadline handle accepted by every engine operation.
///
/// Cloning yields another handle to the same cancellation state, so one
/// thread can hold a clone and call [`cancel`](Context::cancel) while a
/// migration runs on another. Cancellation is cooperative: the engine polls
/// the context between protocol steps (before the transaction opens and
/// before each migration record), so a cancel raised mid-action takes effect
/// at the next step boundary and the in-flight transaction rolls back.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that never cancels and carries no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Signal cancellation to every clone of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Context::cancel) was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail if the context is cancelled or its deadline has passed.
    pub(crate) fn check(&self) -> MigrateResult<()> {
        if self.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(MigrateError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
