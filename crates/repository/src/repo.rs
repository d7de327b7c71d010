use async_trait::async_trait;
use common::{BatchRef, Sku};
use domain::Product;

use crate::Result;

/// Contract every product store must implement.
///
/// The concrete store is an external collaborator; the core only relies on
/// fetching aggregates by sku or by owned batch reference and writing them
/// back at commit time. Seen-aggregate tracking is not the store's job: the
/// `UnitOfWork` owns the seen set, and aggregates enter it only through its
/// `get`/`get_by_batch_ref`/`add` paths.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Fetches the product aggregate for a sku.
    async fn get(&self, sku: &Sku) -> Result<Option<Product>>;

    /// Fetches the product owning the given batch reference.
    async fn get_by_batch_ref(&self, reference: &BatchRef) -> Result<Option<Product>>;

    /// Writes an aggregate back to the store (insert or replace by sku).
    async fn save(&self, product: &Product) -> Result<()>;
}
