//! Aggregate root trait.

/// Aggregate root marker + minimal interface.
///
/// Aggregates in this workspace mutate themselves through their own methods
/// and hand back a domain event per successful mutation. They never perform IO;
/// persistence assigns identity, so the identifier is optional until then.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Domain event type emitted by state changes.
    type Event: Clone + core::fmt::Debug;

    /// Returns the aggregate identifier, `None` until the aggregate is persisted.
    fn id(&self) -> Option<&Self::Id>;

    /// Whether the persistence boundary has assigned an identifier yet.
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}
