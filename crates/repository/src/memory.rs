use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BatchRef, Sku};
use domain::Product;
use tokio::sync::RwLock;

use crate::{Repository, Result};

/// In-memory product store for tests and local runs.
///
/// Stores aggregates keyed by sku and provides the same interface as a
/// persistent implementation. Clones share the underlying map, so one
/// instance can back many units of work.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    products: Arc<RwLock<HashMap<Sku, Product>>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of products stored.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Clears all stored products.
    pub async fn clear(&self) {
        self.products.write().await.clear();
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get(&self, sku: &Sku) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(sku).cloned())
    }

    async fn get_by_batch_ref(&self, reference: &BatchRef) -> Result<Option<Product>> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .find(|p| p.has_batch(reference))
            .cloned())
    }

    async fn save(&self, product: &Product) -> Result<()> {
        // The event outbox is transaction-scoped and must never be persisted.
        let mut stored = product.clone();
        stored.take_events();
        self.products
            .write()
            .await
            .insert(stored.sku().clone(), stored);
        Ok(())
    }
}
