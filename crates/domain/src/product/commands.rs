//! Commands accepted by the allocation system.

use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

/// Intents to change allocation state.
///
/// Each command is routed to exactly one handler; a command failure is fatal
/// to the caller of the message bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    /// Allocate an order line against available stock.
    Allocate(AllocateData),

    /// Register a new stock batch.
    CreateBatch(CreateBatchData),

    /// Correct a batch's purchased quantity.
    ChangeBatchQuantity(ChangeBatchQuantityData),
}

/// Discriminant of a command variant, used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Allocate,
    CreateBatch,
    ChangeBatchQuantity,
}

impl Command {
    /// Returns the variant discriminant.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Allocate(_) => CommandKind::Allocate,
            Command::CreateBatch(_) => CommandKind::CreateBatch,
            Command::ChangeBatchQuantity(_) => CommandKind::ChangeBatchQuantity,
        }
    }

    /// Returns the command type name used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Allocate(_) => "Allocate",
            Command::CreateBatch(_) => "CreateBatch",
            Command::ChangeBatchQuantity(_) => "ChangeBatchQuantity",
        }
    }
}

/// Data for the Allocate command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateData {
    /// The order the line belongs to.
    pub order_id: OrderId,

    /// The product to allocate.
    pub sku: Sku,

    /// Quantity to allocate.
    pub qty: u32,
}

/// Data for the CreateBatch command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBatchData {
    /// The new batch's reference.
    #[serde(rename = "ref")]
    pub reference: BatchRef,

    /// The sku the batch holds stock for.
    pub sku: Sku,

    /// Purchased quantity.
    pub qty: u32,

    /// Estimated arrival date, None for in-warehouse stock.
    pub eta: Option<NaiveDate>,
}

/// Data for the ChangeBatchQuantity command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatchQuantityData {
    /// The batch to correct.
    #[serde(rename = "ref")]
    pub reference: BatchRef,

    /// The new purchased quantity.
    pub qty: u32,
}

// Convenience constructors for commands
impl Command {
    /// Creates an Allocate command.
    pub fn allocate(order_id: impl Into<OrderId>, sku: impl Into<Sku>, qty: u32) -> Self {
        Command::Allocate(AllocateData {
            order_id: order_id.into(),
            sku: sku.into(),
            qty,
        })
    }

    /// Creates a CreateBatch command.
    pub fn create_batch(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        qty: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Command::CreateBatch(CreateBatchData {
            reference: reference.into(),
            sku: sku.into(),
            qty,
            eta,
        })
    }

    /// Creates a ChangeBatchQuantity command.
    pub fn change_batch_quantity(reference: impl Into<BatchRef>, qty: u32) -> Self {
        Command::ChangeBatchQuantity(ChangeBatchQuantityData {
            reference: reference.into(),
            qty,
        })
    }
}
