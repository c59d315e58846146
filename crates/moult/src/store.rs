//! Bookkeeping table access.
//!
//! One row per applied migration; the set of versions present here is the
//! single source of truth for what "applied" means. Every method takes the
//! connection (or an open transaction, which derefs to it), so the engine
//! owns the transaction boundary, not the store.

use duckdb::Connection;

use crate::error::{MigrateError, MigrateResult};

/// SQL access to the bookkeeping table.
#[derive(Debug, Clone)]
pub(crate) struct Store {
    table: String,
}

impl Store {
    pub(crate) fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub(crate) fn table_name(&self) -> &str {
        &self.table
    }

    /// Create the bookkeeping table and its id sequence if absent.
    ///
    /// DuckDB has no AUTOINCREMENT; the surrogate key draws from a
    /// companion sequence instead. Both statements are idempotent.
    pub(crate) fn ensure(&self, conn: &Connection) -> MigrateResult<()> {
        let ddl = format!(
            "CREATE SEQUENCE IF NOT EXISTS {table}_id_seq;
             CREATE TABLE IF NOT EXISTS {table} (
                 id INTEGER PRIMARY KEY DEFAULT nextval('{table}_id_seq'),
                 version INTEGER NOT NULL UNIQUE,
                 description VARCHAR NOT NULL UNIQUE
             );",
            table = self.table
        );
        conn.execute_batch(&ddl).map_err(|e| MigrateError::Store {
            context: format!("creating table {}", self.table),
            source: e,
        })
    }

    /// Ascending list of applied versions, read fresh on every call.
    pub(crate) fn applied_index(&self, conn: &Connection) -> MigrateResult<Vec<u32>> {
        let sql = format!("SELECT version FROM {} ORDER BY version ASC", self.table);
        let mut stmt = conn.prepare(&sql).map_err(|e| MigrateError::Store {
            context: format!("reading applied index from {}", self.table),
            source: e,
        })?;
        let versions = stmt
            .query_map([], |row| row.get::<_, u32>(0))
            .map_err(|e| MigrateError::Store {
                context: format!("reading applied index from {}", self.table),
                source: e,
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MigrateError::Store {
                context: format!("scanning applied index row from {}", self.table),
                source: e,
            })?;
        Ok(versions)
    }

    /// Insert the row marking `version` as applied.
    pub(crate) fn record_applied(
        &self,
        conn: &Connection,
        version: u32,
        description: &str,
    ) -> MigrateResult<()> {
        let sql = format!(
            "INSERT INTO {} (version, description) VALUES (?, ?)",
            self.table
        );
        conn.execute(&sql, duckdb::params![version, description])
            .map_err(|e| MigrateError::Store {
                context: format!(
                    "recording v{version} ({description}) as applied in {}",
                    self.table
                ),
                source: e,
            })?;
        Ok(())
    }

    /// Delete the row for `version`, marking it reverted.
    pub(crate) fn record_reverted(&self, conn: &Connection, version: u32) -> MigrateResult<()> {
        let sql = format!("DELETE FROM {} WHERE version = ?", self.table);
        conn.execute(&sql, duckdb::params![version])
            .map_err(|e| MigrateError::Store {
                context: format!("deleting v{version} from {}", self.table),
                source: e,
            })?;
        Ok(())
    }

    /// Whether the bookkeeping table exists yet.
    ///
    /// Schema-qualified names split on the last `.`; bare names live in
    /// DuckDB's default `main` schema.
    pub(crate) fn table_exists(&self, conn: &Connection) -> MigrateResult<bool> {
        let (schema, table) = match self.table.rfind('.') {
            Some(pos) => (&self.table[..pos], &self.table[pos + 1..]),
            None => ("main", self.table.as_str()),
        };
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = ? AND table_name = ?",
                duckdb::params![schema, table],
                |row| row.get(0),
            )
            .map_err(|e| MigrateError::Store {
                context: format!("checking for table {}", self.table),
                source: e,
            })?;
        Ok(count > 0)
    }

    /// Highest applied version, or 0 when none are applied.
    ///
    /// The table not existing yet is the same observable fact as an empty
    /// table, so both read as 0 rather than an error.
    pub(crate) fn current_version(&self, conn: &Connection) -> MigrateResult<u32> {
        if !self.table_exists(conn)? {
            return Ok(0);
        }
        let sql = format!("SELECT COALESCE(MAX(version), 0) FROM {}", self.table);
        conn.query_row(&sql, [], |row| row.get::<_, u32>(0))
            .map_err(|e| MigrateError::Store {
                context: format!("reading current version from {}", self.table),
                source: e,
            })
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
