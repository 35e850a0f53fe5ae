//! Keyed snapshot repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Read and replace one opaque payload per key.
//!
//! # Invariants
//! - `write_snapshot` runs in a single transaction; a failed write keeps the
//!   prior payload readable.
//! - Payloads are stored verbatim; encoding is the caller's concern.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage for whole-snapshot payloads addressed by key.
pub trait SnapshotRepository: Send {
    /// Returns the stored payload for `key`, or `None` when never written.
    fn read_snapshot(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the payload for `key` atomically.
    fn write_snapshot(&mut self, key: &str, payload: &str, written_at: i64) -> RepoResult<()>;
}

/// SQLite-backed snapshot slot table.
pub struct SqliteSnapshotRepository {
    conn: Connection,
}

impl SqliteSnapshotRepository {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when `snapshots` does not exist.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'snapshots'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable("snapshots"));
        }
        Ok(Self { conn })
    }

    /// Gives the connection back, e.g. to inspect rows in tests.
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn read_snapshot(&self, key: &str) -> RepoResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write_snapshot(&mut self, key: &str, payload: &str, written_at: i64) -> RepoResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO snapshots (key, payload, written_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                written_at = excluded.written_at;",
            params![key, payload, written_at],
        )?;
        tx.commit()?;
        Ok(())
    }
}
