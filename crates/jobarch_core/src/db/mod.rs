//! Storage bootstrap for the job architecture store.
//!
//! # Responsibility
//! - Hand out SQLite connections that are configured and migrated.
//! - Own the schema: the layer adjacency table and the item tree.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`; no other metadata table.
//! - No item is read or written before migrations succeed.
//! - Cascading deletes rely on `foreign_keys=ON`, set on every opened connection.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Errors raised while opening or migrating the store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a connection-level call.
    Sqlite(rusqlite::Error),
    /// One migration script failed; the whole batch was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build of this store.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "job architecture store: {err}"),
            Self::Migration { version, source } => write!(
                f,
                "job architecture store: migration {version} failed: {source}"
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "job architecture store schema {db_version} is newer than this build supports ({latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
