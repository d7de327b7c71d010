//! Repository contract and transactional boundary for the allocation system.
//!
//! This crate provides:
//! - The `Repository` trait every product store must implement
//! - An in-memory implementation for tests and local runs
//! - The `UnitOfWork` that stages repository access, tracks seen aggregates,
//!   and drains their event outboxes once per transaction

mod error;
mod memory;
mod repo;
mod uow;

pub use error::RepositoryError;
pub use memory::InMemoryRepository;
pub use repo::Repository;
pub use uow::UnitOfWork;

/// Convenience result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
