//! Domain layer for the allocation system.
//!
//! This crate provides the core domain model:
//! - `OrderLine` value object and `Batch` entity
//! - `Product` aggregate root applying the allocation rule
//! - `Command` and `Event` unions carried by the message bus

pub mod product;

pub use product::{
    Batch, Command, CommandKind, Event, EventKind, OrderLine, Product, ProductError,
};
