//! Product aggregate implementation.

use common::{BatchRef, Sku};
use serde::{Deserialize, Serialize};

use super::{Batch, Event, OrderLine, ProductError};

/// Product aggregate root.
///
/// Owns every stock batch for a single sku and applies the allocation rule.
/// State changes are recorded as domain events in a transient outbox that the
/// unit of work drains once per transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// The sku this aggregate covers.
    sku: Sku,

    /// Batches kept in allocation-preference order.
    batches: Vec<Batch>,

    /// Pending domain events; never persisted past the transaction boundary.
    #[serde(skip)]
    events: Vec<Event>,

    /// Incremented on every allocation-state change so the persistence
    /// collaborator can enforce optimistic concurrency.
    version_number: u64,
}

impl Product {
    /// Creates a product with an empty batch list.
    pub fn new(sku: impl Into<Sku>) -> Self {
        Self::with_batches(sku, Vec::new())
    }

    /// Creates a product from existing batches.
    pub fn with_batches(sku: impl Into<Sku>, mut batches: Vec<Batch>) -> Self {
        batches.sort_unstable();
        Self {
            sku: sku.into(),
            batches,
            events: Vec::new(),
            version_number: 0,
        }
    }

    /// Returns the sku.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the batches in allocation-preference order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Returns a batch by reference.
    pub fn batch(&self, reference: &BatchRef) -> Option<&Batch> {
        self.batches.iter().find(|b| b.reference() == reference)
    }

    /// Returns true if a batch with the given reference exists.
    pub fn has_batch(&self, reference: &BatchRef) -> bool {
        self.batch(reference).is_some()
    }

    /// Returns the current version number.
    pub fn version_number(&self) -> u64 {
        self.version_number
    }

    /// Returns the pending, not yet drained events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drains the event outbox, leaving it empty.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Allocates an order line against the preferred batch.
    ///
    /// Scans batches in preference order and allocates against the first one
    /// that can take the line, recording an `Allocated` event and returning
    /// the batch reference. If no batch qualifies, records `OutOfStock` and
    /// returns None: stock exhaustion is a business fact for the bus to fan
    /// out, not a failure.
    pub fn allocate(&mut self, line: OrderLine) -> Option<BatchRef> {
        self.batches.sort_unstable();

        match self.batches.iter_mut().find(|b| b.can_allocate(&line)) {
            Some(batch) => {
                let batch_ref = batch.reference().clone();
                batch.allocate(line.clone());
                self.events.push(Event::allocated(&line, batch_ref.clone()));
                self.version_number += 1;
                Some(batch_ref)
            }
            None => {
                self.events.push(Event::out_of_stock(self.sku.clone()));
                None
            }
        }
    }

    /// Corrects a batch's purchased quantity.
    ///
    /// If the correction leaves the batch over-allocated, lines are
    /// deallocated one at a time (largest quantity first, ties by order id)
    /// until the batch is no longer in deficit; each bumped line is recorded
    /// as an `AllocationRequired` event so the bus can re-home it.
    pub fn change_batch_quantity(
        &mut self,
        reference: &BatchRef,
        qty: u32,
    ) -> Result<(), ProductError> {
        let batch = self
            .batches
            .iter_mut()
            .find(|b| b.reference() == reference)
            .ok_or_else(|| ProductError::BatchNotFound {
                reference: reference.clone(),
            })?;

        batch.set_purchased_quantity(qty);
        while batch.available_quantity() < 0 {
            let Some(line) = batch.next_line_to_bump() else {
                break;
            };
            batch.deallocate(&line);
            self.events.push(Event::allocation_required(&line));
        }
        self.version_number += 1;

        Ok(())
    }

    /// Appends a new batch to the product.
    ///
    /// Emits nothing: the triggering `BatchCreated` message is the cause of
    /// this call, not an effect.
    pub fn add_batch(&mut self, batch: Batch) {
        self.batches.push(batch);
        self.batches.sort_unstable();
        self.version_number += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    fn tomorrow() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()
    }

    fn later() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 20).unwrap()
    }

    #[test]
    fn prefers_warehouse_batches_to_shipments() {
        let in_stock = Batch::new("in-stock-batch", "RETRO-CLOCK", 100, None);
        let shipment = Batch::new("shipment-batch", "RETRO-CLOCK", 100, Some(tomorrow()));
        let mut product = Product::with_batches("RETRO-CLOCK", vec![shipment, in_stock]);

        product.allocate(OrderLine::new("order-123", "RETRO-CLOCK", 10));

        let in_stock = product.batch(&BatchRef::new("in-stock-batch")).unwrap();
        let shipment = product.batch(&BatchRef::new("shipment-batch")).unwrap();
        assert_eq!(in_stock.available_quantity(), 90);
        assert_eq!(shipment.available_quantity(), 100);
    }

    #[test]
    fn prefers_earlier_batches() {
        let earliest = Batch::new("speedy-batch", "MINIMALIST-SPOON", 100, Some(today()));
        let medium = Batch::new("normal-batch", "MINIMALIST-SPOON", 100, Some(tomorrow()));
        let latest = Batch::new("slow-batch", "MINIMALIST-SPOON", 100, Some(later()));
        let mut product =
            Product::with_batches("MINIMALIST-SPOON", vec![medium, latest, earliest]);

        product.allocate(OrderLine::new("order-1", "MINIMALIST-SPOON", 10));

        assert_eq!(
            product
                .batch(&BatchRef::new("speedy-batch"))
                .unwrap()
                .available_quantity(),
            90
        );
        assert_eq!(
            product
                .batch(&BatchRef::new("normal-batch"))
                .unwrap()
                .available_quantity(),
            100
        );
        assert_eq!(
            product
                .batch(&BatchRef::new("slow-batch"))
                .unwrap()
                .available_quantity(),
            100
        );
    }

    #[test]
    fn returns_the_allocated_batch_ref() {
        let in_stock = Batch::new("in-stock-batch-ref", "HIGHBROW-POSTER", 100, None);
        let shipment = Batch::new("shipment-batch-ref", "HIGHBROW-POSTER", 100, Some(tomorrow()));
        let mut product = Product::with_batches("HIGHBROW-POSTER", vec![in_stock, shipment]);

        let allocation = product.allocate(OrderLine::new("order-ref", "HIGHBROW-POSTER", 10));

        assert_eq!(allocation, Some(BatchRef::new("in-stock-batch-ref")));
    }

    #[test]
    fn records_out_of_stock_event_if_cannot_allocate() {
        let batch = Batch::new("batch1", "SMALL-FORK", 10, Some(today()));
        let mut product = Product::with_batches("SMALL-FORK", vec![batch]);
        product.allocate(OrderLine::new("order1", "SMALL-FORK", 10));

        let allocation = product.allocate(OrderLine::new("order2", "SMALL-FORK", 1));

        assert_eq!(product.events().last(), Some(&Event::out_of_stock("SMALL-FORK")));
        assert_eq!(allocation, None);
    }

    #[test]
    fn out_of_stock_leaves_quantities_unchanged() {
        let batch = Batch::new("batch1", "SMALL-FORK", 10, None);
        let mut product = Product::with_batches("SMALL-FORK", vec![batch]);

        product.allocate(OrderLine::new("order1", "SMALL-FORK", 25));

        assert_eq!(
            product
                .batch(&BatchRef::new("batch1"))
                .unwrap()
                .available_quantity(),
            10
        );
    }

    #[test]
    fn allocation_records_allocated_event() {
        let batch = Batch::new("batch1", "RETRO-CLOCK", 100, None);
        let mut product = Product::with_batches("RETRO-CLOCK", vec![batch]);
        let line = OrderLine::new("order1", "RETRO-CLOCK", 10);

        product.allocate(line.clone());

        assert_eq!(
            product.events().last(),
            Some(&Event::allocated(&line, BatchRef::new("batch1")))
        );
    }

    #[test]
    fn successful_allocation_increments_version() {
        let batch = Batch::new("batch1", "RETRO-CLOCK", 100, None);
        let mut product = Product::with_batches("RETRO-CLOCK", vec![batch]);
        assert_eq!(product.version_number(), 0);

        product.allocate(OrderLine::new("order1", "RETRO-CLOCK", 10));
        assert_eq!(product.version_number(), 1);

        // Out of stock is not an allocation-state change.
        product.allocate(OrderLine::new("order2", "RETRO-CLOCK", 1000));
        assert_eq!(product.version_number(), 1);
    }

    #[test]
    fn change_batch_quantity_within_capacity_deallocates_nothing() {
        let batch = Batch::new("batch1", "INDIFFERENT-TABLE", 100, None);
        let mut product = Product::with_batches("INDIFFERENT-TABLE", vec![batch]);
        product.allocate(OrderLine::new("order1", "INDIFFERENT-TABLE", 20));
        product.take_events();

        product
            .change_batch_quantity(&BatchRef::new("batch1"), 50)
            .unwrap();

        assert!(product.events().is_empty());
        assert_eq!(
            product
                .batch(&BatchRef::new("batch1"))
                .unwrap()
                .available_quantity(),
            30
        );
    }

    #[test]
    fn shrinking_below_allocations_emits_allocation_required_per_bumped_line() {
        let batch = Batch::new("batch1", "INDIFFERENT-TABLE", 100, None);
        let mut product = Product::with_batches("INDIFFERENT-TABLE", vec![batch]);
        product.allocate(OrderLine::new("order1", "INDIFFERENT-TABLE", 20));
        product.allocate(OrderLine::new("order2", "INDIFFERENT-TABLE", 30));
        product.take_events();

        product
            .change_batch_quantity(&BatchRef::new("batch1"), 25)
            .unwrap();

        // Largest line first: bumping order2 (30) restores a non-negative
        // balance, so exactly one event is emitted.
        let line = OrderLine::new("order2", "INDIFFERENT-TABLE", 30);
        assert_eq!(product.events(), &[Event::allocation_required(&line)]);
        assert_eq!(
            product
                .batch(&BatchRef::new("batch1"))
                .unwrap()
                .available_quantity(),
            5
        );
    }

    #[test]
    fn shrinking_to_zero_bumps_every_line() {
        let batch = Batch::new("batch1", "INDIFFERENT-TABLE", 100, None);
        let mut product = Product::with_batches("INDIFFERENT-TABLE", vec![batch]);
        product.allocate(OrderLine::new("order1", "INDIFFERENT-TABLE", 20));
        product.allocate(OrderLine::new("order2", "INDIFFERENT-TABLE", 30));
        product.take_events();

        product
            .change_batch_quantity(&BatchRef::new("batch1"), 0)
            .unwrap();

        assert_eq!(product.events().len(), 2);
        assert_eq!(
            product
                .batch(&BatchRef::new("batch1"))
                .unwrap()
                .available_quantity(),
            0
        );
    }

    #[test]
    fn change_batch_quantity_unknown_ref_fails() {
        let mut product = Product::new("INDIFFERENT-TABLE");

        let result = product.change_batch_quantity(&BatchRef::new("missing"), 10);

        assert!(matches!(result, Err(ProductError::BatchNotFound { .. })));
    }

    #[test]
    fn take_events_drains_the_outbox() {
        let batch = Batch::new("batch1", "RETRO-CLOCK", 100, None);
        let mut product = Product::with_batches("RETRO-CLOCK", vec![batch]);
        product.allocate(OrderLine::new("order1", "RETRO-CLOCK", 10));

        assert_eq!(product.take_events().len(), 1);
        assert!(product.take_events().is_empty());
    }

    #[test]
    fn add_batch_keeps_preference_order() {
        let mut product = Product::new("RETRO-CLOCK");
        product.add_batch(Batch::new("shipment", "RETRO-CLOCK", 100, Some(tomorrow())));
        product.add_batch(Batch::new("warehouse", "RETRO-CLOCK", 100, None));

        assert_eq!(product.batches()[0].reference(), &BatchRef::new("warehouse"));
        assert!(product.events().is_empty());
    }
}
