//! Product aggregate and related types.

mod aggregate;
mod batch;
mod commands;
mod events;
mod value_objects;

pub use aggregate::Product;
pub use batch::Batch;
pub use commands::{
    AllocateData, ChangeBatchQuantityData, Command, CommandKind, CreateBatchData,
};
pub use events::{
    AllocatedData, AllocationRequiredData, BatchCreatedData, BatchQuantityChangedData, Event,
    EventKind, OutOfStockData,
};
pub use value_objects::OrderLine;

use common::BatchRef;
use thiserror::Error;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// A batch reference does not exist on this product.
    #[error("Batch not found: {reference}")]
    BatchNotFound { reference: BatchRef },
}
