//! Unit-of-work implementations.

mod in_memory;

pub use in_memory::InMemoryUnitOfWork;
