//! Data-access contracts and their implementations.
//!
//! # Responsibility
//! - Define the Company Directory and history store contracts consumed by
//!   services.
//! - Provide a seeded in-memory implementation and a SQLite implementation
//!   of each, interchangeable at composition time.
//!
//! # Invariants
//! - Lookups report "no match" as `Ok(None)` / empty lists, never as errors.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{DbError, SharedConnection};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod company_repo;
pub mod fixtures;
pub mod history_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error raised by directory and history store implementations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Persisted or seeded data does not satisfy model invariants.
    InvalidData(String),
    /// Remote collaborator could not answer.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::Unavailable(message) => write!(f, "directory unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
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

/// Runs `op` against the shared connection on Tokio's blocking pool.
///
/// The connection lock is taken and released inside the blocking task.
pub(crate) async fn on_connection<T, F>(conn: &SharedConnection, op: F) -> RepoResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> RepoResult<T> + Send + 'static,
{
    let conn = SharedConnection::clone(conn);
    tokio::task::spawn_blocking(move || op(&mut conn.lock()))
        .await
        .map_err(|err| RepoError::Unavailable(format!("sqlite task did not complete: {err}")))?
}
