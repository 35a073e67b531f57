// src/storage/schema.rs — Versioned schema for the session database
//
// The applied version lives in SQLite's `user_version` header field, so the
// database file needs no bookkeeping table of its own.

use rusqlite::Connection;
use tracing::info;

/// One forward-only schema step.
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub up: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "key_value",
    up: include_str!("migrations/001_key_value.up.sql"),
}];

/// Newest schema this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Bring the database up to `latest_version()`. Each step commits on its own,
/// so an interrupted upgrade resumes where it stopped.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let from = current_version(conn)?;
    for step in MIGRATIONS.iter().filter(|m| m.version > from) {
        info!(version = step.version, name = step.name, "Upgrading session database");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(step.up)?;
        set_version(&tx, step.version)?;
        tx.commit()?;
    }
    Ok(())
}

pub fn current_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.pragma_query_value(None, "user_version", |r| r.get(0))
}

fn set_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.pragma_update(None, "user_version", version)
}
