//! Publisher trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Event;

use super::AdapterError;

/// Fire-and-forget announcement of domain events to other systems.
///
/// Delivery is at-least-once: the bus retries a failing publish and logs the
/// drop if every attempt fails.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes an event on a named channel.
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), AdapterError>;
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    published: Vec<(String, Event)>,
    attempts: u32,
    fail_times: u32,
}

/// In-memory publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryPublisher {
    /// Creates a new in-memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` publish calls fail.
    pub fn set_fail_times(&self, n: u32) {
        self.state.write().unwrap().fail_times = n;
    }

    /// Returns every successfully published (channel, event) pair.
    pub fn published(&self) -> Vec<(String, Event)> {
        self.state.read().unwrap().published.clone()
    }

    /// Returns the number of successful publishes.
    pub fn publish_count(&self) -> usize {
        self.state.read().unwrap().published.len()
    }

    /// Returns the total number of publish calls, failures included.
    pub fn attempt_count(&self) -> u32 {
        self.state.read().unwrap().attempts
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), AdapterError> {
        let mut state = self.state.write().unwrap();
        state.attempts += 1;

        if state.fail_times > 0 {
            state.fail_times -= 1;
            return Err(AdapterError::Unavailable(
                "publisher unreachable".to_string(),
            ));
        }

        state.published.push((channel.to_string(), event.clone()));
        Ok(())
    }
}
