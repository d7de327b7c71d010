use common::{BatchRef, Sku};
use domain::ProductError;
use repository::RepositoryError;
use thiserror::Error;

use crate::services::AdapterError;

/// Errors raised inside a command or event handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A message referenced a sku with no corresponding product.
    #[error("Invalid sku: {sku}")]
    InvalidSku { sku: Sku },

    /// A message referenced a batch no product owns.
    #[error("Batch not found: {reference}")]
    BatchNotFound { reference: BatchRef },

    /// A handler was invoked with a message variant it was not wired for.
    #[error("Handler for {expected} received {got}")]
    UnexpectedMessage {
        expected: &'static str,
        got: &'static str,
    },

    /// The aggregate rejected the operation.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// The transactional boundary failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// An outbound collaborator failed.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Errors returned to the caller of `MessageBus::handle`.
#[derive(Debug, Error)]
pub enum BusError {
    /// No handler is registered for a command type.
    #[error("No handler registered for command {0}")]
    UnhandledCommand(&'static str),

    /// A command handler failed; commands are all-or-nothing.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl BusError {
    /// Returns true for failures caused by the request itself, which a
    /// collaborator boundary should map to a client-error response.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BusError::Handler(HandlerError::InvalidSku { .. })
                | BusError::Handler(HandlerError::BatchNotFound { .. })
                | BusError::Handler(HandlerError::Product(ProductError::BatchNotFound { .. }))
        )
    }
}
