use common::{BatchRef, Sku};
use domain::{Event, Product};

use crate::{Repository, RepositoryError, Result};

/// A single transaction against one repository.
///
/// The unit of work owns the "seen" set: every aggregate fetched through
/// `get`/`get_by_batch_ref` or staged through `add` is cached here in
/// first-seen order, mutated in place by handlers, and written back on
/// `commit`. Dropping the unit of work without committing discards all
/// staged changes, which guards against forgotten commits and against
/// errors escaping mid-transaction.
pub struct UnitOfWork<R: Repository> {
    repo: R,
    seen: Vec<Product>,
    staged_events: Vec<Event>,
    committed: bool,
}

impl<R: Repository> UnitOfWork<R> {
    /// Opens a new transaction scope over the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            seen: Vec::new(),
            staged_events: Vec::new(),
            committed: false,
        }
    }

    /// Stages a new aggregate and marks it seen.
    ///
    /// If an aggregate with the same sku is already tracked, the tracked one
    /// wins and the argument is discarded.
    pub fn add(&mut self, product: Product) -> &mut Product {
        let idx = match self.seen.iter().position(|p| p.sku() == product.sku()) {
            Some(idx) => idx,
            None => {
                self.seen.push(product);
                self.seen.len() - 1
            }
        };
        &mut self.seen[idx]
    }

    /// Fetches an aggregate by sku, marking it seen.
    ///
    /// Repeated calls for the same sku return the tracked instance rather
    /// than re-reading the store.
    pub async fn get(&mut self, sku: &Sku) -> Result<Option<&mut Product>> {
        let idx = match self.seen.iter().position(|p| p.sku() == sku) {
            Some(idx) => Some(idx),
            None => match self.repo.get(sku).await? {
                Some(product) => {
                    self.seen.push(product);
                    Some(self.seen.len() - 1)
                }
                None => None,
            },
        };
        Ok(idx.map(|i| &mut self.seen[i]))
    }

    /// Fetches the aggregate owning a batch reference, marking it seen.
    pub async fn get_by_batch_ref(&mut self, reference: &BatchRef) -> Result<Option<&mut Product>> {
        let idx = match self.seen.iter().position(|p| p.has_batch(reference)) {
            Some(idx) => Some(idx),
            None => match self.repo.get_by_batch_ref(reference).await? {
                Some(product) => {
                    self.seen.push(product);
                    Some(self.seen.len() - 1)
                }
                None => None,
            },
        };
        Ok(idx.map(|i| &mut self.seen[i]))
    }

    /// Commits the transaction, writing every seen aggregate back.
    ///
    /// Each aggregate's outbox is drained into a staging buffer first so
    /// persisted copies never carry undelivered events. Committing twice is
    /// a programming error and fails fast.
    pub async fn commit(&mut self) -> Result<()> {
        if self.committed {
            return Err(RepositoryError::AlreadyCommitted);
        }
        for product in &mut self.seen {
            self.staged_events.extend(product.take_events());
            self.repo.save(product).await?;
        }
        self.committed = true;
        Ok(())
    }

    /// Returns true once `commit` has succeeded.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Drains and returns every event emitted by the seen aggregates, in
    /// first-seen aggregate order and emission order within an aggregate.
    ///
    /// Draining clears the outboxes, so a second call without new activity
    /// returns nothing.
    pub fn collect_new_events(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.staged_events);
        for product in &mut self.seen {
            events.extend(product.take_events());
        }
        events
    }
}

impl<R: Repository> Drop for UnitOfWork<R> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!("unit of work dropped without commit, staged changes discarded");
        }
    }
}
