//! Notifier trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::AdapterError;

/// Outbound human notification, e.g. an email to the stock desk.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a message to an address.
    async fn send(&self, address: &str, message: &str) -> Result<(), AdapterError>;
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<(String, String)>,
    attempts: u32,
    fail_times: u32,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` send calls fail.
    pub fn set_fail_times(&self, n: u32) {
        self.state.write().unwrap().fail_times = n;
    }

    /// Returns every successfully sent (address, message) pair.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the number of successful sends.
    pub fn send_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns the total number of send calls, failures included.
    pub fn attempt_count(&self) -> u32 {
        self.state.read().unwrap().attempts
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, address: &str, message: &str) -> Result<(), AdapterError> {
        let mut state = self.state.write().unwrap();
        state.attempts += 1;

        if state.fail_times > 0 {
            state.fail_times -= 1;
            return Err(AdapterError::Unavailable("notifier unreachable".to_string()));
        }

        state.sent.push((address.to_string(), message.to_string()));
        Ok(())
    }
}
