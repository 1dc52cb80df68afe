//! `idgate-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod id;
pub mod time;
pub mod value_object;

pub use aggregate::AggregateRoot;
pub use clock::{Clock, FixedClock, IdGenerator, RandomIdGenerator, SystemClock};
pub use error::{DomainError, DomainResult, ErrorCode, ErrorContext};
pub use id::{AccountId, EventId};
pub use time::{Timestamp, Ttl};
pub use value_object::ValueObject;
