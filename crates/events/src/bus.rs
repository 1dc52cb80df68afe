//! Event publishing/subscription abstraction (mechanics only).
//!
//! An [`EventSink`] is anything that accepts events for onward delivery: an
//! outbox table, a broadcast bus, a test recorder. An [`EventBus`] is a sink
//! that can also hand out subscriptions.
//!
//! Delivery is **at-least-once**: consumers must be idempotent. Sinks make no
//! ordering promises across publishers.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use thiserror::Error;

/// Why a sink refused an event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Internal lock poisoning; the sink is unusable until restart.
    #[error("event sink poisoned")]
    Poisoned,

    /// The sink rejected the event (serialization, capacity, ...).
    #[error("event rejected: {0}")]
    Rejected(String),
}

impl PublishError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// A subscription to an event stream.
///
/// Subscriptions are designed for single-threaded consumption. Messages arrive
/// in the order the bus accepted them.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Receives events for onward delivery.
///
/// `publish` is synchronous and must not block on network IO; durable sinks
/// write locally (e.g. an outbox row) and leave the relay to someone else.
pub trait EventSink<M>: Send + Sync {
    fn publish(&self, message: M) -> Result<(), PublishError>;
}

/// Broadcast pub/sub: every subscriber gets a copy of every published message.
pub trait EventBus<M>: EventSink<M> {
    fn subscribe(&self) -> Subscription<M>;
}

impl<M, S> EventSink<M> for Arc<S>
where
    S: EventSink<M> + ?Sized,
{
    fn publish(&self, message: M) -> Result<(), PublishError> {
        (**self).publish(message)
    }
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
