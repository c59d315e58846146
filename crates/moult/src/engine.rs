//! The migration engine: validation, ordering, and the transactional
//! apply/rollback protocol.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use duckdb::Connection;

use crate::context::Context;
use crate::error::{BoxDynError, MigrateError, MigrateResult};
use crate::events::{EventSink, LogSink, MigrationEvent};
use crate::migration::{Migration, MigrationSet};
use crate::store::Store;

/// Default name of the bookkeeping table.
pub const DEFAULT_TABLE_NAME: &str = "_migrations";

/// Engine configuration, fixed at construction.
///
/// ```
/// use moult::Options;
///
/// let options = Options {
///     table_name: "app_meta".to_string(),
///     ..Options::default()
/// };
/// ```
pub struct Options {
    /// Bookkeeping table name. Must stay the same across runs once the
    /// table has been created.
    pub table_name: String,
    /// Progress sink; `None` selects [`LogSink`].
    pub events: Option<Box<dyn EventSink>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            events: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("table_name", &self.table_name)
            .field("events", &self.events.as_ref().map(|_| "<sink>"))
            .finish()
    }
}

/// Applies and reverts a [`MigrationSet`] against one DuckDB database.
///
/// Each run (up or down) executes inside a single transaction: either every
/// migration in the run commits, or the database is left exactly as it was.
/// Already-applied versions are skipped, so re-running the same set is
/// idempotent.
///
/// The engine takes no cross-process lock; run one coordinating process per
/// database at a time. Within a process the engine is `Send + Sync` and
/// serializes runs on an internal mutex.
pub struct Migrator {
    conn: Mutex<Connection>,
    set: MigrationSet,
    store: Store,
    events: Box<dyn EventSink>,
}

impl Migrator {
    /// Open (or create) the database at `path` and bind `set`, with default
    /// [`Options`]. The path `":memory:"` selects an in-memory database.
    pub fn open(path: &str, set: MigrationSet) -> MigrateResult<Self> {
        Self::open_with(path, set, Options::default())
    }

    /// [`open`](Migrator::open) with explicit [`Options`].
    pub fn open_with(path: &str, set: MigrationSet, options: Options) -> MigrateResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| MigrateError::Connection {
            context: format!("opening {path}"),
            source: e,
        })?;
        Ok(Self::from_connection_with(conn, set, options))
    }

    /// Bind to an already-open connection, with default [`Options`]. For
    /// callers managing connection lifecycle themselves.
    pub fn from_connection(conn: Connection, set: MigrationSet) -> Self {
        Self::from_connection_with(conn, set, Options::default())
    }

    /// [`from_connection`](Migrator::from_connection) with explicit
    /// [`Options`].
    pub fn from_connection_with(conn: Connection, set: MigrationSet, options: Options) -> Self {
        Self {
            conn: Mutex::new(conn),
            set,
            store: Store::new(options.table_name),
            events: options.events.unwrap_or_else(|| Box::new(LogSink)),
        }
    }

    /// The bookkeeping table name this engine writes to.
    pub fn table_name(&self) -> &str {
        self.store.table_name()
    }

    /// Direct access to the underlying connection, serialized with
    /// migration runs.
    ///
    /// Lets callers query the migrated database through the same handle the
    /// engine owns. Drop the guard before the next migration call on this
    /// engine, which blocks until the lock is free.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Apply every migration in the set not yet applied, in ascending
    /// version order, inside one transaction.
    ///
    /// Records already applied are skipped and reported as
    /// [`MigrationEvent::Skipped`]; any validation or action failure rolls
    /// the entire run back, including migrations applied earlier in the
    /// same call.
    pub fn migrate_up(&self, ctx: &Context) -> MigrateResult<()> {
        ctx.check()?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(|e| MigrateError::Transaction {
            context: "beginning migrate-up".to_string(),
            source: e,
        })?;

        self.store.ensure(&tx)?;
        let applied = self.store.applied_index(&tx)?;

        let mut seen: HashSet<u32> = HashSet::new();
        for migration in self.set.sorted() {
            ctx.check()?;
            let (up, _) = migration
                .validate()
                .map_err(|reason| invalid(migration, reason))?;
            if !seen.insert(migration.version()) {
                return Err(MigrateError::DuplicateMigration {
                    version: migration.version(),
                    description: migration.description().to_string(),
                });
            }
            if applied.contains(&migration.version()) {
                self.events.emit(&MigrationEvent::Skipped {
                    version: migration.version(),
                    description: migration.description().to_string(),
                });
                continue;
            }

            up.run(&tx).map_err(|e| action_failed(migration, e))?;
            self.store
                .record_applied(&tx, migration.version(), migration.description())?;
            self.events.emit(&MigrationEvent::Applied {
                version: migration.version(),
                description: migration.description().to_string(),
            });
        }

        tx.commit().map_err(|e| MigrateError::Transaction {
            context: "committing migrate-up".to_string(),
            source: e,
        })
    }

    /// Revert up to `amount` most-recently-applied migrations, newest
    /// first, inside one transaction.
    ///
    /// `amount` larger than the applied count reverts everything; an empty
    /// applied index fails with [`MigrateError::NothingToRevert`]. Records
    /// to revert are resolved from the set by version, so non-contiguous
    /// version numbering is fine; an applied version missing from the set
    /// fails with [`MigrateError::NotApplied`].
    pub fn migrate_down(&self, ctx: &Context, amount: usize) -> MigrateResult<()> {
        ctx.check()?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(|e| MigrateError::Transaction {
            context: "beginning migrate-down".to_string(),
            source: e,
        })?;

        self.store.ensure(&tx)?;
        let applied = self.store.applied_index(&tx)?;
        if applied.is_empty() {
            return Err(MigrateError::NothingToRevert);
        }

        let amount = amount.min(applied.len());
        for &version in applied.iter().rev().take(amount) {
            ctx.check()?;
            let migration = self
                .set
                .find(version)
                .ok_or(MigrateError::NotApplied { version })?;
            let (_, down) = migration
                .validate()
                .map_err(|reason| invalid(migration, reason))?;

            down.run(&tx).map_err(|e| action_failed(migration, e))?;
            self.store.record_reverted(&tx, version)?;
            self.events.emit(&MigrationEvent::Reverted {
                version,
                description: migration.description().to_string(),
            });
        }

        tx.commit().map_err(|e| MigrateError::Transaction {
            context: "committing migrate-down".to_string(),
            source: e,
        })
    }

    /// Highest applied version, or 0 when none are applied.
    ///
    /// A standalone read outside any migration transaction; it reflects
    /// committed state only.
    pub fn current_version(&self, ctx: &Context) -> MigrateResult<u32> {
        ctx.check()?;
        let conn = self.conn.lock().unwrap();
        self.store.current_version(&conn)
    }

    /// Release the underlying connection.
    pub fn close(self) -> MigrateResult<()> {
        let conn = self.conn.into_inner().unwrap();
        conn.close().map_err(|(_, e)| MigrateError::Connection {
            context: "closing database".to_string(),
            source: e,
        })
    }
}

fn invalid(migration: &Migration, reason: &'static str) -> MigrateError {
    MigrateError::InvalidMigration {
        version: migration.version(),
        description: migration.description().to_string(),
        reason,
    }
}

fn action_failed(migration: &Migration, source: BoxDynError) -> MigrateError {
    MigrateError::Action {
        version: migration.version(),
        description: migration.description().to_string(),
        source,
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
