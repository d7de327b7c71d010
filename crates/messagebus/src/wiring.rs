//! Default handler wiring for the allocation system.

use std::sync::Arc;

use domain::{CommandKind, EventKind};
use repository::Repository;

use crate::handlers::{
    AddBatchHandler, AllocateHandler, ChangeBatchQuantityHandler, OutOfStockNotificationHandler,
    PublishAllocatedHandler, ReallocateHandler,
};
use crate::registry::HandlerRegistry;
use crate::services::{Notifier, Publisher};

/// Builds the standard routing table.
///
/// `BatchCreated` and `BatchQuantityChanged` are deliberately left unwired;
/// they exist for downstream consumers and pass through the bus as no-ops.
pub fn default_registry<R: Repository>(
    publisher: Arc<dyn Publisher>,
    notifier: Arc<dyn Notifier>,
) -> HandlerRegistry<R> {
    HandlerRegistry::new()
        .on_command(CommandKind::Allocate, Arc::new(AllocateHandler))
        .on_command(CommandKind::CreateBatch, Arc::new(AddBatchHandler))
        .on_command(
            CommandKind::ChangeBatchQuantity,
            Arc::new(ChangeBatchQuantityHandler),
        )
        .on_event(EventKind::AllocationRequired, Arc::new(ReallocateHandler))
        .on_event(
            EventKind::Allocated,
            Arc::new(PublishAllocatedHandler::new(publisher)),
        )
        .on_event(
            EventKind::OutOfStock,
            Arc::new(OutOfStockNotificationHandler::new(notifier)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryNotifier, InMemoryPublisher};
    use repository::InMemoryRepository;

    #[test]
    fn every_command_kind_is_routed() {
        let registry: HandlerRegistry<InMemoryRepository> = default_registry(
            Arc::new(InMemoryPublisher::new()),
            Arc::new(InMemoryNotifier::new()),
        );

        assert!(registry.command_handler(CommandKind::Allocate).is_some());
        assert!(registry.command_handler(CommandKind::CreateBatch).is_some());
        assert!(registry
            .command_handler(CommandKind::ChangeBatchQuantity)
            .is_some());
        assert_eq!(registry.event_handlers(EventKind::AllocationRequired).len(), 1);
        assert!(registry.event_handlers(EventKind::BatchCreated).is_empty());
    }
}
