//! Domain events emitted by the product aggregate or received from
//! collaborating systems.

use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

use super::OrderLine;

/// Facts that have happened in the allocation domain.
///
/// Events are fanned out to zero-or-more handlers by the message bus;
/// a handler failure never bubbles past its own retry envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A new stock batch was registered.
    BatchCreated(BatchCreatedData),

    /// An order line needs (re-)allocation.
    AllocationRequired(AllocationRequiredData),

    /// An order line was allocated to a batch.
    Allocated(AllocatedData),

    /// No batch could satisfy an order line for this sku.
    OutOfStock(OutOfStockData),

    /// A batch's purchased quantity was corrected.
    BatchQuantityChanged(BatchQuantityChangedData),
}

/// Discriminant of an event variant, used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BatchCreated,
    AllocationRequired,
    Allocated,
    OutOfStock,
    BatchQuantityChanged,
}

impl Event {
    /// Returns the variant discriminant.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::BatchCreated(_) => EventKind::BatchCreated,
            Event::AllocationRequired(_) => EventKind::AllocationRequired,
            Event::Allocated(_) => EventKind::Allocated,
            Event::OutOfStock(_) => EventKind::OutOfStock,
            Event::BatchQuantityChanged(_) => EventKind::BatchQuantityChanged,
        }
    }

    /// Returns the event type name used for logging and wire envelopes.
    pub fn name(&self) -> &'static str {
        match self {
            Event::BatchCreated(_) => "BatchCreated",
            Event::AllocationRequired(_) => "AllocationRequired",
            Event::Allocated(_) => "Allocated",
            Event::OutOfStock(_) => "OutOfStock",
            Event::BatchQuantityChanged(_) => "BatchQuantityChanged",
        }
    }
}

/// Data for the BatchCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCreatedData {
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

/// Data for the AllocationRequired event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequiredData {
    /// The order the bumped line belongs to.
    pub order_id: OrderId,

    /// The sku to re-allocate.
    pub sku: Sku,

    /// Quantity to re-allocate.
    pub qty: u32,
}

/// Data for the Allocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedData {
    /// The order the line belongs to.
    pub order_id: OrderId,

    /// The allocated sku.
    pub sku: Sku,

    /// Allocated quantity.
    pub qty: u32,

    /// The batch the line landed on.
    pub batch_ref: BatchRef,
}

/// Data for the OutOfStock event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStockData {
    /// The exhausted sku.
    pub sku: Sku,
}

/// Data for the BatchQuantityChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQuantityChangedData {
    /// The corrected batch's reference.
    #[serde(rename = "ref")]
    pub reference: BatchRef,

    /// The new purchased quantity.
    pub qty: u32,
}

// Convenience constructors for events
impl Event {
    /// Creates a BatchCreated event.
    pub fn batch_created(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        qty: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Event::BatchCreated(BatchCreatedData {
            reference: reference.into(),
            sku: sku.into(),
            qty,
            eta,
        })
    }

    /// Creates an AllocationRequired event for a bumped line.
    pub fn allocation_required(line: &OrderLine) -> Self {
        Event::AllocationRequired(AllocationRequiredData {
            order_id: line.order_id.clone(),
            sku: line.sku.clone(),
            qty: line.qty,
        })
    }

    /// Creates an Allocated event.
    pub fn allocated(line: &OrderLine, batch_ref: BatchRef) -> Self {
        Event::Allocated(AllocatedData {
            order_id: line.order_id.clone(),
            sku: line.sku.clone(),
            qty: line.qty,
            batch_ref,
        })
    }

    /// Creates an OutOfStock event.
    pub fn out_of_stock(sku: impl Into<Sku>) -> Self {
        Event::OutOfStock(OutOfStockData { sku: sku.into() })
    }

    /// Creates a BatchQuantityChanged event.
    pub fn batch_quantity_changed(reference: impl Into<BatchRef>, qty: u32) -> Self {
        Event::BatchQuantityChanged(BatchQuantityChangedData {
            reference: reference.into(),
            qty,
        })
    }
}
