//! Domain events and the mechanics for handing them to collaborators.
//!
//! Event *types* live next to the domain that emits them; this crate only
//! defines what an event is and how it leaves the process boundary.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, EventSink, PublishError, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
