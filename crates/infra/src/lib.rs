//! Infrastructure layer: storage adapters, outbox, configuration.
//!
//! Only in-memory adapters live here; relational storage and the broker
//! relay plug in behind the same traits.

pub mod config;
pub mod outbox;
pub mod unit_of_work;

pub use config::{AuthSettings, ConfigError};
pub use outbox::{OutboxEventSink, OutboxRow, OutboxStatus};
pub use unit_of_work::InMemoryUnitOfWork;
