//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by repositories.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.

use super::DbResult;
use crate::config::DatabaseConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Busy timeout applied when no configuration overrides it.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_logged("file", DEFAULT_BUSY_TIMEOUT, || Connection::open(path))
}

/// Opens an in-memory SQLite database.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_logged("memory", DEFAULT_BUSY_TIMEOUT, Connection::open_in_memory)
}

/// Opens the database described by `config`; no path means in-memory.
pub fn open_db_with_config(config: &DatabaseConfig) -> DbResult<Connection> {
    let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
    match config.path.as_deref() {
        Some(path) => open_logged("file", busy_timeout, || Connection::open(path)),
        None => open_logged("memory", busy_timeout, Connection::open_in_memory),
    }
}

fn open_logged(
    mode: &str,
    busy_timeout: Duration,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn, busy_timeout) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

fn bootstrap_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}
