//! Concrete command and event handlers.

use std::sync::Arc;

use async_trait::async_trait;
use common::BatchRef;
use domain::{Batch, Command, Event, OrderLine, Product};
use repository::{Repository, UnitOfWork};

use crate::error::HandlerError;
use crate::registry::{CommandHandler, EventHandler};
use crate::services::{Notifier, Publisher};

/// Channel on which `Allocated` events are announced to other systems.
pub const LINE_ALLOCATED_CHANNEL: &str = "line_allocated";

/// Address notified when a sku runs out of stock.
pub const STOCK_ALERTS_ADDRESS: &str = "stock@example.com";

/// Handles `Allocate`: finds the product and runs the allocation rule.
pub struct AllocateHandler;

#[async_trait]
impl<R: Repository> CommandHandler<R> for AllocateHandler {
    #[tracing::instrument(skip(self, uow))]
    async fn handle(
        &self,
        command: Command,
        uow: &mut UnitOfWork<R>,
    ) -> Result<Option<BatchRef>, HandlerError> {
        let got = command.name();
        let Command::Allocate(data) = command else {
            return Err(HandlerError::UnexpectedMessage {
                expected: "Allocate",
                got,
            });
        };

        let line = OrderLine::new(data.order_id, data.sku.clone(), data.qty);
        let batch_ref = {
            let product = uow
                .get(&data.sku)
                .await?
                .ok_or(HandlerError::InvalidSku { sku: data.sku })?;
            product.allocate(line)
        };
        uow.commit().await?;

        Ok(batch_ref)
    }
}

/// Handles `CreateBatch`: creates the product on first sight of a sku and
/// appends the new batch.
pub struct AddBatchHandler;

#[async_trait]
impl<R: Repository> CommandHandler<R> for AddBatchHandler {
    #[tracing::instrument(skip(self, uow))]
    async fn handle(
        &self,
        command: Command,
        uow: &mut UnitOfWork<R>,
    ) -> Result<Option<BatchRef>, HandlerError> {
        let got = command.name();
        let Command::CreateBatch(data) = command else {
            return Err(HandlerError::UnexpectedMessage {
                expected: "CreateBatch",
                got,
            });
        };

        let batch = Batch::new(data.reference, data.sku.clone(), data.qty, data.eta);
        // Pull any stored product into the seen set; `add` then either stages
        // a fresh aggregate or hands back the tracked one.
        uow.get(&data.sku).await?;
        uow.add(Product::new(data.sku)).add_batch(batch);
        uow.commit().await?;

        Ok(None)
    }
}

/// Handles `ChangeBatchQuantity`: corrects a batch's purchased quantity,
/// letting the aggregate bump lines that no longer fit.
pub struct ChangeBatchQuantityHandler;

#[async_trait]
impl<R: Repository> CommandHandler<R> for ChangeBatchQuantityHandler {
    #[tracing::instrument(skip(self, uow))]
    async fn handle(
        &self,
        command: Command,
        uow: &mut UnitOfWork<R>,
    ) -> Result<Option<BatchRef>, HandlerError> {
        let got = command.name();
        let Command::ChangeBatchQuantity(data) = command else {
            return Err(HandlerError::UnexpectedMessage {
                expected: "ChangeBatchQuantity",
                got,
            });
        };

        {
            let product = uow.get_by_batch_ref(&data.reference).await?.ok_or(
                HandlerError::BatchNotFound {
                    reference: data.reference.clone(),
                },
            )?;
            product.change_batch_quantity(&data.reference, data.qty)?;
        }
        uow.commit().await?;

        Ok(None)
    }
}

/// Handles `AllocationRequired`: re-homes a bumped line by re-running the
/// allocation rule, which may cascade further.
pub struct ReallocateHandler;

#[async_trait]
impl<R: Repository> EventHandler<R> for ReallocateHandler {
    #[tracing::instrument(skip(self, uow))]
    async fn handle(&self, event: Event, uow: &mut UnitOfWork<R>) -> Result<(), HandlerError> {
        let got = event.name();
        let Event::AllocationRequired(data) = event else {
            return Err(HandlerError::UnexpectedMessage {
                expected: "AllocationRequired",
                got,
            });
        };

        let line = OrderLine::new(data.order_id, data.sku.clone(), data.qty);
        {
            let product = uow
                .get(&data.sku)
                .await?
                .ok_or(HandlerError::InvalidSku { sku: data.sku })?;
            product.allocate(line);
        }
        uow.commit().await?;

        Ok(())
    }
}

/// Handles `Allocated`: announces the allocation to other systems.
pub struct PublishAllocatedHandler {
    publisher: Arc<dyn Publisher>,
}

impl PublishAllocatedHandler {
    /// Creates a handler publishing on the `line_allocated` channel.
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl<R: Repository> EventHandler<R> for PublishAllocatedHandler {
    #[tracing::instrument(skip(self, _uow))]
    async fn handle(&self, event: Event, _uow: &mut UnitOfWork<R>) -> Result<(), HandlerError> {
        if !matches!(event, Event::Allocated(_)) {
            return Err(HandlerError::UnexpectedMessage {
                expected: "Allocated",
                got: event.name(),
            });
        }

        self.publisher
            .publish(LINE_ALLOCATED_CHANNEL, &event)
            .await?;
        Ok(())
    }
}

/// Handles `OutOfStock`: notifies the stock desk.
pub struct OutOfStockNotificationHandler {
    notifier: Arc<dyn Notifier>,
    address: String,
}

impl OutOfStockNotificationHandler {
    /// Creates a handler notifying the default stock alerts address.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_address(notifier, STOCK_ALERTS_ADDRESS)
    }

    /// Creates a handler notifying a custom address.
    pub fn with_address(notifier: Arc<dyn Notifier>, address: impl Into<String>) -> Self {
        Self {
            notifier,
            address: address.into(),
        }
    }
}

#[async_trait]
impl<R: Repository> EventHandler<R> for OutOfStockNotificationHandler {
    #[tracing::instrument(skip(self, _uow))]
    async fn handle(&self, event: Event, _uow: &mut UnitOfWork<R>) -> Result<(), HandlerError> {
        let got = event.name();
        let Event::OutOfStock(data) = event else {
            return Err(HandlerError::UnexpectedMessage {
                expected: "OutOfStock",
                got,
            });
        };

        self.notifier
            .send(&self.address, &format!("Out of stock for {}", data.sku))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Sku;
    use domain::EventKind;
    use repository::InMemoryRepository;

    use crate::services::{InMemoryNotifier, InMemoryPublisher};

    async fn uow() -> UnitOfWork<InMemoryRepository> {
        UnitOfWork::new(InMemoryRepository::new())
    }

    #[tokio::test]
    async fn add_batch_creates_the_product_on_first_sight() {
        let repo = InMemoryRepository::new();
        let mut uow = UnitOfWork::new(repo.clone());

        AddBatchHandler
            .handle(Command::create_batch("b1", "RETRO-CLOCK", 100, None), &mut uow)
            .await
            .unwrap();

        let product = repo.get(&Sku::new("RETRO-CLOCK")).await.unwrap().unwrap();
        assert!(product.has_batch(&BatchRef::new("b1")));
        assert!(uow.is_committed());
    }

    #[tokio::test]
    async fn add_batch_appends_to_an_existing_product() {
        let repo = InMemoryRepository::new();
        let mut uow = UnitOfWork::new(repo.clone());
        AddBatchHandler
            .handle(Command::create_batch("b1", "GARISH-RUG", 100, None), &mut uow)
            .await
            .unwrap();

        let mut uow = UnitOfWork::new(repo.clone());
        AddBatchHandler
            .handle(Command::create_batch("b2", "GARISH-RUG", 99, None), &mut uow)
            .await
            .unwrap();

        let product = repo.get(&Sku::new("GARISH-RUG")).await.unwrap().unwrap();
        assert_eq!(product.batches().len(), 2);
    }

    #[tokio::test]
    async fn allocate_returns_the_batch_ref() {
        let repo = InMemoryRepository::new();
        let mut uow = UnitOfWork::new(repo.clone());
        AddBatchHandler
            .handle(
                Command::create_batch("batch1", "COMPLICATED-LAMP", 100, None),
                &mut uow,
            )
            .await
            .unwrap();

        let mut uow = UnitOfWork::new(repo);
        let result = AllocateHandler
            .handle(Command::allocate("o1", "COMPLICATED-LAMP", 10), &mut uow)
            .await
            .unwrap();

        assert_eq!(result, Some(BatchRef::new("batch1")));
    }

    #[tokio::test]
    async fn allocate_errors_for_invalid_sku() {
        let mut uow = uow().await;

        let result = AllocateHandler
            .handle(Command::allocate("o1", "NONEXISTENT-SKU", 10), &mut uow)
            .await;

        assert!(matches!(result, Err(HandlerError::InvalidSku { .. })));
        assert!(!uow.is_committed());
    }

    #[tokio::test]
    async fn change_batch_quantity_errors_for_unknown_ref() {
        let mut uow = uow().await;

        let result = ChangeBatchQuantityHandler
            .handle(Command::change_batch_quantity("batch-999", 10), &mut uow)
            .await;

        assert!(matches!(result, Err(HandlerError::BatchNotFound { .. })));
    }

    #[tokio::test]
    async fn change_batch_quantity_emits_allocation_required_for_bumped_lines() {
        let repo = InMemoryRepository::new();
        let mut uow = UnitOfWork::new(repo.clone());
        AddBatchHandler
            .handle(
                Command::create_batch("batch1", "INDIFFERENT-TABLE", 50, None),
                &mut uow,
            )
            .await
            .unwrap();
        let mut uow = UnitOfWork::new(repo.clone());
        AllocateHandler
            .handle(Command::allocate("order1", "INDIFFERENT-TABLE", 20), &mut uow)
            .await
            .unwrap();
        uow.collect_new_events();

        let mut uow = UnitOfWork::new(repo);
        ChangeBatchQuantityHandler
            .handle(Command::change_batch_quantity("batch1", 10), &mut uow)
            .await
            .unwrap();

        let events = uow.collect_new_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::AllocationRequired);
    }

    #[tokio::test]
    async fn out_of_stock_notification_reaches_the_stock_desk() {
        let notifier = InMemoryNotifier::new();
        let handler = OutOfStockNotificationHandler::new(Arc::new(notifier.clone()));
        let mut uow = uow().await;

        EventHandler::<InMemoryRepository>::handle(
            &handler,
            Event::out_of_stock("RETRO-CLOCK"),
            &mut uow,
        )
        .await
        .unwrap();

        let (address, message) = &notifier.sent()[0];
        assert_eq!(address, STOCK_ALERTS_ADDRESS);
        assert_eq!(message, "Out of stock for RETRO-CLOCK");
    }

    #[tokio::test]
    async fn allocated_events_are_published_on_the_line_allocated_channel() {
        let publisher = InMemoryPublisher::new();
        let handler = PublishAllocatedHandler::new(Arc::new(publisher.clone()));
        let mut uow = uow().await;

        let line = OrderLine::new("o1", "RETRO-CLOCK", 10);
        let event = Event::allocated(&line, BatchRef::new("batch1"));
        EventHandler::<InMemoryRepository>::handle(&handler, event.clone(), &mut uow)
            .await
            .unwrap();

        assert_eq!(
            publisher.published(),
            vec![(LINE_ALLOCATED_CHANNEL.to_string(), event)]
        );
    }
}
