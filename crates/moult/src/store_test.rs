//! Tests for bookkeeping table DDL, row bookkeeping, and version reads.

use duckdb::Connection;

use crate::error::MigrateError;
use crate::store::Store;

// ── Helpers ────────────────────────────────────────────────────────────

/// Fresh in-memory connection.
fn mem_conn() -> Connection {
    Connection::open_in_memory().unwrap()
}

/// Store over the default table name.
fn store() -> Store {
    Store::new("_migrations")
}

/// Query a single i64 value (convenience for COUNT(*) assertions).
fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0)).unwrap()
}

// ── Table lifecycle ────────────────────────────────────────────────────

#[test]
fn ensure_creates_the_table() {
    let conn = mem_conn();
    let s = store();

    assert!(!s.table_exists(&conn).unwrap());
    s.ensure(&conn).unwrap();
    assert!(s.table_exists(&conn).unwrap());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM _migrations"), 0);
}

#[test]
fn ensure_is_idempotent() {
    let conn = mem_conn();
    let s = store();

    s.ensure(&conn).unwrap();
    s.record_applied(&conn, 1, "first").unwrap();
    s.ensure(&conn).unwrap();

    // the second ensure must not clobber existing rows
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM _migrations"), 1);
}

#[test]
fn schema_qualified_table_name_works() {
    let conn = mem_conn();
    conn.execute_batch("CREATE SCHEMA staging").unwrap();
    let s = Store::new("staging.applied");

    assert!(!s.table_exists(&conn).unwrap());
    s.ensure(&conn).unwrap();
    assert!(s.table_exists(&conn).unwrap());

    s.record_applied(&conn, 1, "first").unwrap();
    assert_eq!(s.applied_index(&conn).unwrap(), vec![1]);
}

// ── Applied index ──────────────────────────────────────────────────────

#[test]
fn applied_index_is_ascending() {
    let conn = mem_conn();
    let s = store();
    s.ensure(&conn).unwrap();

    s.record_applied(&conn, 3, "third").unwrap();
    s.record_applied(&conn, 1, "first").unwrap();
    s.record_applied(&conn, 2, "second").unwrap();

    assert_eq!(s.applied_index(&conn).unwrap(), vec![1, 2, 3]);
}

#[test]
fn applied_index_empty_on_new_table() {
    let conn = mem_conn();
    let s = store();
    s.ensure(&conn).unwrap();

    assert!(s.applied_index(&conn).unwrap().is_empty());
}

#[test]
fn record_reverted_deletes_the_row() {
    let conn = mem_conn();
    let s = store();
    s.ensure(&conn).unwrap();

    s.record_applied(&conn, 1, "first").unwrap();
    s.record_applied(&conn, 2, "second").unwrap();
    s.record_reverted(&conn, 1).unwrap();

    assert_eq!(s.applied_index(&conn).unwrap(), vec![2]);
}

#[test]
fn surrogate_ids_are_distinct() {
    let conn = mem_conn();
    let s = store();
    s.ensure(&conn).unwrap();

    s.record_applied(&conn, 1, "first").unwrap();
    s.record_applied(&conn, 2, "second").unwrap();

    assert_eq!(count(&conn, "SELECT COUNT(DISTINCT id) FROM _migrations"), 2);
}

// ── Constraints ────────────────────────────────────────────────────────

#[test]
fn duplicate_version_violates_unique_constraint() {
    let conn = mem_conn();
    let s = store();
    s.ensure(&conn).unwrap();

    s.record_applied(&conn, 1, "first").unwrap();
    let err = s.record_applied(&conn, 1, "other").unwrap_err();
    assert!(matches!(err, MigrateError::Store { .. }));
}

#[test]
fn duplicate_description_violates_unique_constraint() {
    let conn = mem_conn();
    let s = store();
    s.ensure(&conn).unwrap();

    s.record_applied(&conn, 1, "same words").unwrap();
    let err = s.record_applied(&conn, 2, "same words").unwrap_err();
    assert!(matches!(err, MigrateError::Store { .. }));
}

// ── Current version ────────────────────────────────────────────────────

#[test]
fn current_version_zero_without_table() {
    let conn = mem_conn();
    assert_eq!(store().current_version(&conn).unwrap(), 0);
}

#[test]
fn current_version_zero_on_empty_table() {
    let conn = mem_conn();
    let s = store();
    s.ensure(&conn).unwrap();

    assert_eq!(s.current_version(&conn).unwrap(), 0);
}

#[test]
fn current_version_is_the_maximum() {
    let conn = mem_conn();
    let s = store();
    s.ensure(&conn).unwrap();

    s.record_applied(&conn, 1, "first").unwrap();
    s.record_applied(&conn, 5, "fifth").unwrap();
    s.record_applied(&conn, 3, "third").unwrap();

    assert_eq!(s.current_version(&conn).unwrap(), 5);
}

// ── Transactional use ──────────────────────────────────────────────────

#[test]
fn writes_inside_a_dropped_transaction_roll_back() {
    let mut conn = mem_conn();
    let s = store();
    s.ensure(&conn).unwrap();

    {
        let tx = conn.transaction().unwrap();
        s.record_applied(&tx, 1, "first").unwrap();
        // dropped without commit
    }

    assert!(s.applied_index(&conn).unwrap().is_empty());
}

#[test]
fn writes_inside_a_committed_transaction_persist() {
    let mut conn = mem_conn();
    let s = store();

    let tx = conn.transaction().unwrap();
    s.ensure(&tx).unwrap();
    s.record_applied(&tx, 1, "first").unwrap();
    tx.commit().unwrap();

    assert_eq!(s.applied_index(&conn).unwrap(), vec![1]);
}
