//! Playlist store and service errors.

use thiserror::Error;

use crate::playlist::models::PlaylistId;

/// The store could not answer a query.
#[derive(Debug, Error)]
pub enum DataAccessError {
    /// Pool exhausted, closed, or the database file is unreachable.
    #[error("data store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DataAccessError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => DataAccessError::Unavailable(err),
            other => DataAccessError::Query(other),
        }
    }
}

/// Errors surfaced by [`PlaylistService`](crate::playlist::PlaylistService).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("playlist {0} not found")]
    NotFound(PlaylistId),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}
