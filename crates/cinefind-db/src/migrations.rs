//! Schema version management using `PRAGMA user_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version.
const CURRENT_VERSION: u32 = 2;

/// Runs database migrations up to `CURRENT_VERSION`.
///
/// # Errors
///
/// Returns an error if any SQL statement fails.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;

    if version < 1 {
        migrate_v1(conn).context("migration to v1 failed")?;
    }
    if version < 2 {
        migrate_v2(conn).context("migration to v2 failed")?;
    }

    if version != CURRENT_VERSION {
        tracing::debug!(from = version, to = CURRENT_VERSION, "migrated schema");
        conn.pragma_update(None, "user_version", CURRENT_VERSION)
            .context("failed to update user_version")?;
    }

    Ok(())
}

/// Migration to v1: create the `search_counts` table.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS search_counts (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            search_term  TEXT NOT NULL UNIQUE,
            count        INTEGER NOT NULL DEFAULT 1,
            movie_id     INTEGER NOT NULL,
            poster_url   TEXT,
            title        TEXT NOT NULL
        );",
    )
    .context("failed to create search_counts table")?;

    Ok(())
}

/// Migration to v2: index `count` for the trending query.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_search_counts_count ON search_counts(count DESC);",
    )
    .context("failed to create count index")?;

    Ok(())
}
