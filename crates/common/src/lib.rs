//! Shared identifier types used across the allocation system.

mod types;

pub use types::{BatchRef, OrderId, Sku};
