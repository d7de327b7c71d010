use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::BatchRef;
use domain::{Command, CommandKind, Event, EventKind};
use repository::{Repository, UnitOfWork};

use crate::error::HandlerError;

/// Handler for a command: exactly one per command kind.
///
/// Command handlers may return a value (the `Allocate` handler returns the
/// chosen batch reference); the bus accumulates these for the caller.
#[async_trait]
pub trait CommandHandler<R: Repository>: Send + Sync {
    async fn handle(
        &self,
        command: Command,
        uow: &mut UnitOfWork<R>,
    ) -> Result<Option<BatchRef>, HandlerError>;
}

/// Handler for an event: zero or more per event kind.
#[async_trait]
pub trait EventHandler<R: Repository>: Send + Sync {
    async fn handle(&self, event: Event, uow: &mut UnitOfWork<R>) -> Result<(), HandlerError>;
}

/// Static routing table from message kind to handlers.
///
/// Built once at wiring time and injected into the bus; the bus never
/// mutates it. Commands map to exactly one handler, events to a fan-out
/// list that may be empty.
pub struct HandlerRegistry<R: Repository> {
    commands: HashMap<CommandKind, Arc<dyn CommandHandler<R>>>,
    events: HashMap<EventKind, Vec<Arc<dyn EventHandler<R>>>>,
}

impl<R: Repository> HandlerRegistry<R> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            events: HashMap::new(),
        }
    }

    /// Registers the handler for a command kind, replacing any previous one.
    pub fn on_command(mut self, kind: CommandKind, handler: Arc<dyn CommandHandler<R>>) -> Self {
        self.commands.insert(kind, handler);
        self
    }

    /// Appends a handler to an event kind's fan-out list.
    pub fn on_event(mut self, kind: EventKind, handler: Arc<dyn EventHandler<R>>) -> Self {
        self.events.entry(kind).or_default().push(handler);
        self
    }

    /// Looks up the handler for a command kind.
    pub fn command_handler(&self, kind: CommandKind) -> Option<&Arc<dyn CommandHandler<R>>> {
        self.commands.get(&kind)
    }

    /// Returns the handlers for an event kind; empty if none registered.
    pub fn event_handlers(&self, kind: EventKind) -> &[Arc<dyn EventHandler<R>>] {
        self.events.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<R: Repository> Default for HandlerRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::InMemoryRepository;

    struct NoopEventHandler;

    #[async_trait]
    impl<R: Repository> EventHandler<R> for NoopEventHandler {
        async fn handle(&self, _: Event, _: &mut UnitOfWork<R>) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn unregistered_event_kind_has_no_handlers() {
        let registry: HandlerRegistry<InMemoryRepository> = HandlerRegistry::new();
        assert!(registry.event_handlers(EventKind::OutOfStock).is_empty());
        assert!(registry.command_handler(CommandKind::Allocate).is_none());
    }

    #[test]
    fn event_handlers_fan_out_in_registration_order() {
        let registry: HandlerRegistry<InMemoryRepository> = HandlerRegistry::new()
            .on_event(EventKind::Allocated, Arc::new(NoopEventHandler))
            .on_event(EventKind::Allocated, Arc::new(NoopEventHandler));

        assert_eq!(registry.event_handlers(EventKind::Allocated).len(), 2);
    }
}
