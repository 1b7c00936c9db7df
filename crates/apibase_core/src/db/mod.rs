//! SQLite connection bootstrap.
//!
//! # Responsibility
//! - Open and configure SQLite connections shared by repositories.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout.
//! - Schema creation belongs to the caller; this layer never migrates.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_config, DEFAULT_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
