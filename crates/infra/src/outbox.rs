//! Transactional-outbox event sink (in-memory).
//!
//! Account events are turned into outbox rows: a topic, the headers a broker
//! consumer dispatches on (`type`, `v`) and the JSON envelope. A separate
//! relay (out of scope here) drains [`OutboxEventSink::ready_for_publishing`]
//! and marks rows as it ships them; delivery is at-least-once.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use idgate_auth::AccountEvent;
use idgate_core::EventId;
use idgate_events::{Event, EventEnvelope, EventSink, PublishError};

pub const AGGREGATE_TYPE: &str = "account";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Failed,
    Published,
}

impl OutboxStatus {
    fn is_ready(self) -> bool {
        matches!(self, OutboxStatus::Pending | OutboxStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxRow {
    pub topic: String,
    pub headers: BTreeMap<String, String>,
    pub envelope: EventEnvelope<JsonValue>,
    pub status: OutboxStatus,
}

impl OutboxRow {
    pub fn id(&self) -> EventId {
        self.envelope.event_id()
    }
}

/// Name consumers dispatch on, independent of the Rust type.
fn message_type(event: &AccountEvent) -> &'static str {
    match event {
        AccountEvent::Registered(_) => "AccountRegistered",
        AccountEvent::Activated(_) => "AccountActivated",
        AccountEvent::Deactivated(_) => "AccountDeactivated",
        AccountEvent::PasswordChanged(_) => "AccountPasswordChanged",
        AccountEvent::RoleAdded(_) => "AccountRoleAdded",
        AccountEvent::RoleRemoved(_) => "AccountRoleRemoved",
    }
}

fn to_row(event: &AccountEvent) -> Result<OutboxRow, PublishError> {
    let aggregate_id = event.account_id().map(|id| id.to_string());
    let envelope = EventEnvelope::from_typed(AGGREGATE_TYPE, aggregate_id, event)
        .map_err(|e| PublishError::rejected(format!("serialize {}: {e}", event.event_type())))?;

    let headers = BTreeMap::from([
        ("type".to_string(), message_type(event).to_string()),
        ("v".to_string(), event.version().to_string()),
    ]);

    Ok(OutboxRow {
        topic: event.event_type().to_string(),
        headers,
        envelope,
        status: OutboxStatus::Pending,
    })
}

#[derive(Debug, Default)]
pub struct OutboxEventSink {
    rows: Mutex<Vec<OutboxRow>>,
}

impl OutboxEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending or previously failed rows, oldest first.
    pub fn ready_for_publishing(&self, limit: Option<usize>) -> Vec<OutboxRow> {
        let Ok(rows) = self.rows.lock() else {
            return Vec::new();
        };
        rows.iter()
            .filter(|r| r.status.is_ready())
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn mark_published(&self, id: EventId) -> bool {
        self.set_status(id, OutboxStatus::Published)
    }

    pub fn mark_failed(&self, id: EventId) -> bool {
        self.set_status(id, OutboxStatus::Failed)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_status(&self, id: EventId, status: OutboxStatus) -> bool {
        let Ok(mut rows) = self.rows.lock() else {
            return false;
        };
        match rows.iter_mut().find(|r| r.id() == id) {
            Some(row) => {
                row.status = status;
                true
            }
            None => false,
        }
    }
}

impl EventSink<AccountEvent> for OutboxEventSink {
    fn publish(&self, event: AccountEvent) -> Result<(), PublishError> {
        let row = to_row(&event)?;
        tracing::debug!(topic = %row.topic, event_id = %row.id(), "outbox row written");

        self.rows
            .lock()
            .map_err(|_| PublishError::Poisoned)?
            .push(row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use idgate_auth::{Account, Email, PasswordHash};
    use idgate_core::AccountId;

    use super::*;

    fn registered() -> AccountEvent {
        let mut account = Account::new(Email::parse("a@b.com").unwrap(), PasswordHash::new("h"));
        account.assign_id(AccountId::new()).unwrap();
        account.registered_event(Utc::now())
    }

    #[test]
    fn registration_becomes_a_pending_row() {
        let sink = OutboxEventSink::new();
        let event = registered();
        sink.publish(event.clone()).unwrap();

        let rows = sink.ready_for_publishing(None);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.topic, "account.registered");
        assert_eq!(row.headers["type"], "AccountRegistered");
        assert_eq!(row.headers["v"], "1");
        assert_eq!(row.status, OutboxStatus::Pending);
        assert_eq!(row.envelope.aggregate_type(), AGGREGATE_TYPE);
        assert_eq!(
            row.envelope.aggregate_id().map(str::to_string),
            event.account_id().map(|id| id.to_string())
        );
        assert_eq!(row.envelope.payload()["email"], "a@b.com");
    }

    #[test]
    fn published_rows_are_no_longer_ready() {
        let sink = OutboxEventSink::new();
        sink.publish(registered()).unwrap();
        sink.publish(registered()).unwrap();

        let first = sink.ready_for_publishing(Some(1));
        assert_eq!(first.len(), 1);
        assert!(sink.mark_published(first[0].id()));

        let rest = sink.ready_for_publishing(None);
        assert_eq!(rest.len(), 1);
        assert_ne!(rest[0].id(), first[0].id());
    }

    #[test]
    fn failed_rows_are_retried() {
        let sink = OutboxEventSink::new();
        sink.publish(registered()).unwrap();

        let id = sink.ready_for_publishing(None)[0].id();
        assert!(sink.mark_failed(id));
        assert_eq!(sink.ready_for_publishing(None)[0].status, OutboxStatus::Failed);
        assert!(!sink.mark_published(EventId::new()));
    }
}
