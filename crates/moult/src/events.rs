//! Structured progress events emitted during a migration run.

use serde::Serialize;

/// One observable step of a migration run.
///
/// Events are emitted as steps complete inside the run's transaction. A
/// later failure rolls the database back but cannot un-emit, so a sink sees
/// intent rather than durability; only a run that returns `Ok` committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MigrationEvent {
    /// A forward action ran and the version was recorded as applied.
    Applied { version: u32, description: String },
    /// The version was already recorded as applied; nothing ran.
    Skipped { version: u32, description: String },
    /// A reverse action ran and the version's bookkeeping row was deleted.
    Reverted { version: u32, description: String },
}

/// Observer for migration progress, supplied through
/// [`Options`](crate::Options).
///
/// Implemented by [`LogSink`] (the default) and by any
/// `Fn(&MigrationEvent) + Send + Sync` closure.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &MigrationEvent);
}

impl<F> EventSink for F
where
    F: Fn(&MigrationEvent) + Send + Sync,
{
    fn emit(&self, event: &MigrationEvent) {
        self(event)
    }
}

/// Default sink: routes events through the `log` facade.
///
/// Applied and reverted migrations log at `info`, skips at `debug`.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &MigrationEvent) {
        match event {
            MigrationEvent::Applied {
                version,
                description,
            } => {
                log::info!("Applied migration v{version}: {description}");
            }
            MigrationEvent::Skipped {
                version,
                description,
            } => {
                log::debug!("Skipping migration v{version} ({description}): already applied");
            }
            MigrationEvent::Reverted {
                version,
                description,
            } => {
                log::info!("Reverted migration v{version}: {description}");
            }
        }
    }
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
