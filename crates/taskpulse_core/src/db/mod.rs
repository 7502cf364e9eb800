//! Task database access.
//!
//! `open` hands out migrated connections; `migrations` owns the schema
//! history. Repositories only ever see a connection that went through both.
//!
//! # Invariants
//! - A database stamped with a newer `user_version` than this build knows is
//!   refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the task database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The database file's parent directory could not be created.
    Directory(std::io::Error),
    /// Written by a newer binary.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "task database error: {err}"),
            Self::Directory(err) => write!(f, "cannot create task database directory: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "task database is at schema v{found}, this build only understands up to v{supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Directory(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
