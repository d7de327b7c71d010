//! Stock batch entity.

use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use common::{BatchRef, Sku};
use serde::{Deserialize, Serialize};

use super::OrderLine;

/// A batch of purchased stock for a single sku.
///
/// Identity is the batch reference. Batches are totally ordered by allocation
/// preference: in-warehouse stock (no eta) sorts before every dated batch,
/// earlier etas sort first, and ties fall back to the reference so that the
/// order is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    reference: BatchRef,
    sku: Sku,
    purchased_quantity: u32,
    eta: Option<NaiveDate>,
    allocations: HashSet<OrderLine>,
}

impl Batch {
    /// Creates a new batch with no allocations.
    pub fn new(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        qty: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            reference: reference.into(),
            sku: sku.into(),
            purchased_quantity: qty,
            eta,
            allocations: HashSet::new(),
        }
    }

    /// Returns the batch reference.
    pub fn reference(&self) -> &BatchRef {
        &self.reference
    }

    /// Returns the sku this batch holds stock for.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the estimated arrival date, or None for in-warehouse stock.
    pub fn eta(&self) -> Option<NaiveDate> {
        self.eta
    }

    /// Returns the purchased quantity.
    pub fn purchased_quantity(&self) -> u32 {
        self.purchased_quantity
    }

    pub(crate) fn set_purchased_quantity(&mut self, qty: u32) {
        self.purchased_quantity = qty;
    }

    /// Returns the total quantity currently allocated from this batch.
    pub fn allocated_quantity(&self) -> u32 {
        self.allocations.iter().map(|line| line.qty).sum()
    }

    /// Returns the quantity still available for allocation.
    ///
    /// Signed because a quantity correction can briefly push a batch into
    /// deficit before the aggregate deallocates lines to restore it.
    pub fn available_quantity(&self) -> i64 {
        i64::from(self.purchased_quantity) - i64::from(self.allocated_quantity())
    }

    /// Returns true if the line's sku matches and enough stock is available.
    pub fn can_allocate(&self, line: &OrderLine) -> bool {
        self.sku == line.sku && i64::from(line.qty) <= self.available_quantity()
    }

    /// Allocates a line against this batch.
    ///
    /// No-op if the line cannot be allocated; re-allocating an identical line
    /// is also a no-op (set semantics).
    pub fn allocate(&mut self, line: OrderLine) {
        if self.can_allocate(&line) {
            self.allocations.insert(line);
        }
    }

    /// Removes a line from this batch's allocations if present.
    pub fn deallocate(&mut self, line: &OrderLine) {
        self.allocations.remove(line);
    }

    /// Returns true if the given line is allocated to this batch.
    pub fn has_allocation(&self, line: &OrderLine) -> bool {
        self.allocations.contains(line)
    }

    /// Returns the number of lines allocated to this batch.
    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }

    /// Picks the next line to deallocate when the batch is in deficit:
    /// largest quantity first, ties broken by ascending order id.
    pub(crate) fn next_line_to_bump(&self) -> Option<OrderLine> {
        self.allocations
            .iter()
            .max_by_key(|line| (line.qty, Reverse(line.order_id.clone())))
            .cloned()
    }
}

impl PartialEq for Batch {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Batch {}

impl Hash for Batch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

impl Ord for Batch {
    fn cmp(&self, other: &Self) -> Ordering {
        // Option's derived ordering puts None (in-warehouse) first.
        self.eta
            .cmp(&other.eta)
            .then_with(|| self.reference.cmp(&other.reference))
    }
}

impl PartialOrd for Batch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
