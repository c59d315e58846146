//! Error types for the migration engine.

use thiserror::Error;

/// Boxed dynamic error returned by caller-supplied migration actions.
///
/// Actions run arbitrary statements, so their failures can be anything that
/// implements [`std::error::Error`]; `duckdb::Error` converts into this via
/// the standard blanket `From`, which keeps `?` working inside action bodies.
pub type BoxDynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// A record failed field validation: zero version, empty description,
    /// or a missing forward/reverse action (MIG001).
    #[error("[MIG001] Invalid migration v{version} ({description:?}): {reason}")]
    InvalidMigration {
        version: u32,
        description: String,
        reason: &'static str,
    },

    /// Two records in the supplied set share a version (MIG002).
    #[error("[MIG002] Duplicate migration version {version} ({description:?})")]
    DuplicateMigration { version: u32, description: String },

    /// Rollback was requested but no migration is applied (MIG003).
    #[error("[MIG003] No migrations to roll back")]
    NothingToRevert,

    /// The bookkeeping store records an applied version that the supplied
    /// set has no record for (MIG004).
    #[error("[MIG004] Migration v{version} is recorded as applied but not present in the set")]
    NotApplied { version: u32 },

    /// A caller-supplied forward/reverse action failed; the cause is
    /// carried unmodified (MIG005).
    #[error("[MIG005] Migration v{version} ({description:?}) failed: {source}")]
    Action {
        version: u32,
        description: String,
        #[source]
        source: BoxDynError,
    },

    /// Failure creating, reading, or writing the bookkeeping table (MIG006).
    #[error("[MIG006] Bookkeeping store failed: {context}")]
    Store {
        context: String,
        #[source]
        source: duckdb::Error,
    },

    /// Failed to open or close the database connection (MIG007).
    #[error("[MIG007] Connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: duckdb::Error,
    },

    /// Failed to begin or commit the migration transaction (MIG008).
    #[error("[MIG008] Transaction failed: {context}")]
    Transaction {
        context: String,
        #[source]
        source: duckdb::Error,
    },

    /// The caller's context was cancelled before the run finished (MIG009).
    #[error("[MIG009] Migration run cancelled")]
    Cancelled,

    /// The caller's context deadline passed before the run finished (MIG010).
    #[error("[MIG010] Migration run deadline exceeded")]
    DeadlineExceeded,
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
