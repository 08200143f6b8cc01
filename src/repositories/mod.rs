pub mod account_repository;
pub mod feedback_repository;
pub mod item_repository;

use thiserror::Error;

/// Error surface shared by all repository implementations. Callers treat any
/// variant as "the backend call failed"; no retries anywhere.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Conflict(String),
}
