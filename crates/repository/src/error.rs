use thiserror::Error;

/// Errors that can occur at the transactional boundary.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// `commit` was called more than once on the same unit of work.
    #[error("Unit of work already committed")]
    AlreadyCommitted,

    /// The backing store failed.
    #[error("Storage backend error: {0}")]
    Backend(String),
}
