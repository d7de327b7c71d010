//! Message bus for the allocation system.
//!
//! The bus drives a FIFO worklist of commands and events:
//! - Commands are routed to exactly one handler; a failure aborts the whole
//!   `handle` call and bubbles to the caller.
//! - Events fan out to zero-or-more handlers; each handler gets a retry
//!   envelope with exponential backoff, and an exhausted handler is logged
//!   and dropped without blocking siblings.
//! - Events emitted by a handler's unit of work are requeued, so a single
//!   quantity correction can cascade into reallocations until the system
//!   settles.

mod bus;
mod error;
mod handlers;
mod messages;
mod registry;
mod retry;
pub mod services;
mod wiring;

pub use bus::MessageBus;
pub use error::{BusError, HandlerError};
pub use handlers::{
    AddBatchHandler, AllocateHandler, ChangeBatchQuantityHandler, OutOfStockNotificationHandler,
    PublishAllocatedHandler, ReallocateHandler, LINE_ALLOCATED_CHANNEL, STOCK_ALERTS_ADDRESS,
};
pub use messages::Message;
pub use registry::{CommandHandler, EventHandler, HandlerRegistry};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use wiring::default_registry;
