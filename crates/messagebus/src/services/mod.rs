//! Outbound collaborator contracts and in-memory test doubles.

mod notifier;
mod publisher;

pub use notifier::{InMemoryNotifier, Notifier};
pub use publisher::{InMemoryPublisher, Publisher};

use thiserror::Error;

/// Errors raised by outbound collaborators.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The collaborator could not be reached or rejected the call.
    #[error("{0}")]
    Unavailable(String),
}
