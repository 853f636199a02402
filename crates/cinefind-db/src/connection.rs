//! Database file location and connection setup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::migrations::run_migrations;

/// Database file name.
const DB_FILE_NAME: &str = "cinefind.db";

/// How long a writer waits for a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the search-count database and brings its schema up to date.
///
/// - If `dir` is `Some`, uses `{dir}/cinefind.db`.
/// - Else if `XDG_DATA_HOME` is set, uses `$XDG_DATA_HOME/cinefind/cinefind.db`.
/// - Otherwise uses `~/.local/share/cinefind/cinefind.db`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the database
/// cannot be opened, or migrations fail.
pub fn open_db(dir: Option<&PathBuf>) -> Result<Connection> {
    let db_path = resolve_db_path(dir)?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    prepare(&conn)?;

    tracing::debug!(path = %db_path.display(), "opened search-count database");
    Ok(conn)
}

/// Opens a migrated in-memory database.
///
/// # Errors
///
/// Returns an error if migrations fail.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    prepare(&conn)?;
    Ok(conn)
}

/// Applies connection settings and runs migrations.
fn prepare(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;
    run_migrations(conn).context("database migration failed")
}

/// Resolves the database file path.
///
/// # Errors
///
/// Returns an error if `dir` is `None` and neither `XDG_DATA_HOME`
/// nor `HOME` is set.
pub fn resolve_db_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(DB_FILE_NAME));
    }

    let data_home = match std::env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME").context("HOME environment variable is not set")?;
            PathBuf::from(home).join(".local").join("share")
        }
    };
    Ok(data_home.join("cinefind").join(DB_FILE_NAME))
}
