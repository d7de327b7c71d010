//! The message bus: a FIFO worklist over commands and events.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use common::BatchRef;
use domain::{Command, Event};
use repository::{Repository, UnitOfWork};

use crate::error::{BusError, HandlerError};
use crate::messages::Message;
use crate::registry::HandlerRegistry;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Routes messages to their handlers and drives the resulting cascade.
///
/// Each handler invocation runs in its own unit of work; events collected
/// from a successful unit of work are requeued at the back of the worklist,
/// so processing is breadth-first and terminates once the aggregates stop
/// emitting.
pub struct MessageBus<R: Repository + Clone> {
    repo: R,
    registry: Arc<HandlerRegistry<R>>,
    retry: RetryPolicy,
}

impl<R: Repository + Clone> MessageBus<R> {
    /// Creates a bus over a repository and a routing table.
    pub fn new(repo: R, registry: HandlerRegistry<R>) -> Self {
        Self {
            repo,
            registry: Arc::new(registry),
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the retry policy applied to event handlers.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Processes a message and everything it cascades into.
    ///
    /// Returns the command handler results in processing order. A command
    /// failure aborts the whole call; event handler failures are retried,
    /// then logged and dropped.
    #[tracing::instrument(skip_all, fields(message = tracing::field::Empty))]
    pub async fn handle(
        &self,
        message: impl Into<Message>,
    ) -> Result<Vec<Option<BatchRef>>, BusError> {
        let message = message.into();
        tracing::Span::current().record("message", message.name());

        let started = Instant::now();
        let mut queue: VecDeque<Message> = VecDeque::from([message]);
        let mut results = Vec::new();

        while let Some(message) = queue.pop_front() {
            match message {
                Message::Command(command) => {
                    let (result, new_events) = self.handle_command(command).await?;
                    results.push(result);
                    queue.extend(new_events.into_iter().map(Message::Event));
                }
                Message::Event(event) => {
                    let new_events = self.handle_event(event).await;
                    queue.extend(new_events.into_iter().map(Message::Event));
                }
            }
        }

        metrics::histogram!("bus_handle_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(results)
    }

    async fn handle_command(
        &self,
        command: Command,
    ) -> Result<(Option<BatchRef>, Vec<Event>), BusError> {
        let name = command.name();
        let handler = self
            .registry
            .command_handler(command.kind())
            .ok_or(BusError::UnhandledCommand(name))?;

        tracing::debug!(command = name, "handling command");
        let mut uow = UnitOfWork::new(self.repo.clone());
        match handler.handle(command, &mut uow).await {
            Ok(result) => {
                metrics::counter!("bus_commands_processed").increment(1);
                Ok((result, uow.collect_new_events()))
            }
            Err(error) => {
                tracing::error!(command = name, error = %error, "command handler failed");
                Err(error.into())
            }
        }
    }

    async fn handle_event(&self, event: Event) -> Vec<Event> {
        let name = event.name();
        let mut new_events = Vec::new();

        for handler in self.registry.event_handlers(event.kind()) {
            tracing::debug!(event = name, "handling event");
            let attempt = || {
                let handler = Arc::clone(handler);
                let event = event.clone();
                let repo = self.repo.clone();
                async move {
                    let mut uow = UnitOfWork::new(repo);
                    handler.handle(event, &mut uow).await?;
                    Ok::<_, HandlerError>(uow)
                }
            };

            match retry_with_backoff(&self.retry, attempt).await {
                Ok(mut uow) => new_events.extend(uow.collect_new_events()),
                Err(error) => {
                    tracing::error!(event = name, error = %error, "event handler exhausted retries, dropping");
                    metrics::counter!("bus_events_dropped").increment(1);
                }
            }
        }

        new_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::InMemoryRepository;

    #[tokio::test]
    async fn unhandled_command_is_an_error() {
        let bus = MessageBus::new(InMemoryRepository::new(), HandlerRegistry::new());

        let result = bus.handle(Command::allocate("o1", "RETRO-CLOCK", 10)).await;

        assert!(matches!(result, Err(BusError::UnhandledCommand("Allocate"))));
    }

    #[tokio::test]
    async fn event_with_no_handlers_is_a_silent_no_op() {
        let bus = MessageBus::new(InMemoryRepository::new(), HandlerRegistry::new());

        let results = bus.handle(Event::out_of_stock("RETRO-CLOCK")).await.unwrap();

        assert!(results.is_empty());
    }
}
