//! Transactional schema migrations for DuckDB.
//!
//! Tracks ordered, reversible schema changes in a bookkeeping table and
//! applies each exactly once, in version order. A run (up or down) executes
//! inside a single transaction, so a failing migration leaves the database
//! untouched. Callers describe each change as a versioned record with
//! forward and reverse actions; the engine owns validation, ordering,
//! idempotent skipping, and rollback-by-count.
//!
//! No cross-process lock is taken; running one coordinating process per
//! database at a time is a caller responsibility.
//!
//! ```no_run
//! use moult::{Context, Migration, MigrationSet, Migrator};
//!
//! fn main() -> moult::MigrateResult<()> {
//!     let set = MigrationSet::new().with(
//!         Migration::new(1, "create users")
//!             .up(|tx| {
//!                 tx.execute_batch("CREATE TABLE users (id INTEGER, name VARCHAR)")?;
//!                 Ok(())
//!             })
//!             .down(|tx| {
//!                 tx.execute_batch("DROP TABLE users")?;
//!                 Ok(())
//!             }),
//!     );
//!
//!     let migrator = Migrator::open("app.duckdb", set)?;
//!     migrator.migrate_up(&Context::new())?;
//!     assert_eq!(migrator.current_version(&Context::new())?, 1);
//!     migrator.close()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod migration;
pub(crate) mod store;

pub use context::Context;
pub use engine::{Migrator, Options, DEFAULT_TABLE_NAME};
pub use error::{BoxDynError, MigrateError, MigrateResult};
pub use events::{EventSink, LogSink, MigrationEvent};
pub use migration::{Migration, MigrationAction, MigrationSet};
