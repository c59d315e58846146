//! Migration records, their actions, and the caller-supplied set.

use std::fmt;

use duckdb::Transaction;

use crate::error::BoxDynError;

/// Executable unit that applies or undoes one schema change.
///
/// Runs against the engine's open transaction; an error aborts the whole run
/// and rolls the transaction back, with the cause surfaced unmodified.
/// Blanket-implemented for `Fn(&Transaction<'_>) -> Result<(), BoxDynError>`
/// closures, so most callers never implement it by hand.
pub trait MigrationAction: Send + Sync {
    fn run(&self, tx: &Transaction<'_>) -> Result<(), BoxDynError>;
}

impl<F> MigrationAction for F
where
    F: Fn(&Transaction<'_>) -> Result<(), BoxDynError> + Send + Sync,
{
    fn run(&self, tx: &Transaction<'_>) -> Result<(), BoxDynError> {
        self(tx)
    }
}

/// One versioned, reversible schema change.
///
/// `version` defines application order (ascending) and rollback order
/// (descending); `description` is the human-readable identity stored next to
/// it. Both actions must be attached before the engine will accept the
/// record; a record missing either fails validation at run time rather than
/// construction time, so sets can be assembled incrementally.
///
/// ```no_run
/// use moult::Migration;
///
/// let m = Migration::new(1, "create users")
///     .up(|tx| {
///         tx.execute_batch("CREATE TABLE users (id INTEGER, email VARCHAR)")?;
///         Ok(())
///     })
///     .down(|tx| {
///         tx.execute_batch("DROP TABLE users")?;
///         Ok(())
///     });
/// ```
pub struct Migration {
    version: u32,
    description: String,
    up: Option<Box<dyn MigrationAction>>,
    down: Option<Box<dyn MigrationAction>>,
}

impl Migration {
    /// A record with no actions attached yet.
    pub fn new(version: u32, description: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            up: None,
            down: None,
        }
    }

    /// Attach the forward action as a closure.
    pub fn up<F>(mut self, action: F) -> Self
    where
        F: Fn(&Transaction<'_>) -> Result<(), BoxDynError> + Send + Sync + 'static,
    {
        self.up = Some(Box::new(action));
        self
    }

    /// Attach the reverse action as a closure.
    pub fn down<F>(mut self, action: F) -> Self
    where
        F: Fn(&Transaction<'_>) -> Result<(), BoxDynError> + Send + Sync + 'static,
    {
        self.down = Some(Box::new(action));
        self
    }

    /// Attach an already-boxed forward action.
    pub fn up_action(mut self, action: Box<dyn MigrationAction>) -> Self {
        self.up = Some(action);
        self
    }

    /// Attach an already-boxed reverse action.
    pub fn down_action(mut self, action: Box<dyn MigrationAction>) -> Self {
        self.down = Some(action);
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Field validation shared by both engine directions.
    ///
    /// Returns the `(forward, reverse)` action pair on success, so callers
    /// that passed validation never re-check for presence.
    pub(crate) fn validate(
        &self,
    ) -> Result<(&dyn MigrationAction, &dyn MigrationAction), &'static str> {
        if self.version == 0 || self.description.is_empty() {
            return Err("version and description must be set");
        }
        match (self.up.as_deref(), self.down.as_deref()) {
            (Some(up), Some(down)) => Ok((up, down)),
            _ => Err("up and down actions must be set"),
        }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("description", &self.description)
            .field("up", &self.up.as_ref().map(|_| "<action>"))
            .field("down", &self.down.as_ref().map(|_| "<action>"))
            .finish()
    }
}

/// The caller's full collection of migration records.
///
/// Construction order carries no meaning; the engine always works from
/// [`sorted`](MigrationSet::sorted). Versions need not be contiguous.
#[derive(Debug, Default)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, migration: Migration) {
        self.migrations.push(migration);
    }

    /// Fluent [`push`](MigrationSet::push).
    pub fn with(mut self, migration: Migration) -> Self {
        self.migrations.push(migration);
        self
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Snapshot of the records ordered by ascending version.
    ///
    /// Stable sort: records sharing a version (invalid, caught by the
    /// engine's duplicate check) keep their insertion order.
    pub fn sorted(&self) -> Vec<&Migration> {
        let mut view: Vec<&Migration> = self.migrations.iter().collect();
        view.sort_by_key(|m| m.version);
        view
    }

    /// The record carrying `version`, if the set holds one.
    pub fn find(&self, version: u32) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.version == version)
    }
}

impl From<Vec<Migration>> for MigrationSet {
    fn from(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }
}

impl FromIterator<Migration> for MigrationSet {
    fn from_iter<I: IntoIterator<Item = Migration>>(iter: I) -> Self {
        Self {
            migrations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
