//! Schema migrations for the job architecture store.
//!
//! # Responsibility
//! - List the schema scripts in the order they must run.
//! - Bring a connection from its recorded `user_version` up to the latest one.
//!
//! # Invariants
//! - Script versions start at 1 and increase by one.
//! - All pending scripts run in a single transaction; a failing script leaves
//!   the file at its previous version.
//! - Migration 1 seeds the layer adjacency table; it is never edited at runtime.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

/// `(version, script)` pairs, oldest first.
const SCHEMA_SCRIPTS: &[(u32, &str)] = &[(1, include_str!("0001_job_architecture.sql"))];

/// Returns the latest schema version known by this build.
pub fn latest_version() -> u32 {
    SCHEMA_SCRIPTS.last().map_or(0, |(version, _)| *version)
}

/// Applies every script newer than the connection's `user_version`.
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the file is ahead of this build.
/// - [`DbError::Migration`] when a script fails; nothing is committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let to_version = latest_version();
    if from_version > to_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: to_version,
        });
    }

    let pending: Vec<_> = SCHEMA_SCRIPTS
        .iter()
        .filter(|(version, _)| *version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for &&(version, script) in &pending {
        let applied = tx
            .execute_batch(script)
            .and_then(|()| tx.pragma_update(None, "user_version", version));
        if let Err(source) = applied {
            error!(
                "event=db_migrate module=db status=error version={} error={}",
                version, source
            );
            return Err(DbError::Migration { version, source });
        }
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} scripts={}",
        from_version,
        to_version,
        pending.len()
    );
    Ok(())
}
