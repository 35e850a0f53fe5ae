use rusqlite::Connection;
use ttlnote_core::db::migrations::{latest_version, schema_version};
use ttlnote_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn fresh_database_gets_snapshot_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_eq!(
        column_names(&conn, "snapshots"),
        vec!["key", "payload", "written_at"]
    );
}

#[test]
fn reopening_keeps_rows_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ttlnote.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO snapshots (key, payload, written_at) VALUES ('notes', '[]', 1);",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second).unwrap(), latest_version());
    let payload: String = second
        .query_row(
            "SELECT payload FROM snapshots WHERE key = 'notes';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(payload, "[]");
}

#[test]
fn database_from_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 42;")
        .unwrap();

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 42);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn conflicting_table_surfaces_failed_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conflict.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE snapshots (key TEXT);")
        .unwrap();

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, name, .. } => {
            assert_eq!(version, 1);
            assert_eq!(name, "snapshots");
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}
