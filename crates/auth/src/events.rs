//! Account domain events.
//!
//! One event per successful account mutation. They are the only channel
//! through which collaborators (outbox, messaging) learn of account changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use idgate_core::AccountId;
use idgate_events::Event;

use crate::credentials::Email;
use crate::roles::Role;

/// Emitted once, when an account is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRegistered {
    pub account_id: Option<AccountId>,
    pub email: Email,
    pub username: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivated {
    pub account_id: Option<AccountId>,
    pub email: Email,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDeactivated {
    pub account_id: Option<AccountId>,
    pub email: Email,
    pub occurred_at: DateTime<Utc>,
}

/// Carries no hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPasswordChanged {
    pub account_id: Option<AccountId>,
    pub email: Email,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoleAdded {
    pub account_id: Option<AccountId>,
    pub email: Email,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoleRemoved {
    pub account_id: Option<AccountId>,
    pub email: Email,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// All account events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountEvent {
    Registered(AccountRegistered),
    Activated(AccountActivated),
    Deactivated(AccountDeactivated),
    PasswordChanged(AccountPasswordChanged),
    RoleAdded(AccountRoleAdded),
    RoleRemoved(AccountRoleRemoved),
}

impl AccountEvent {
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            AccountEvent::Registered(e) => e.account_id,
            AccountEvent::Activated(e) => e.account_id,
            AccountEvent::Deactivated(e) => e.account_id,
            AccountEvent::PasswordChanged(e) => e.account_id,
            AccountEvent::RoleAdded(e) => e.account_id,
            AccountEvent::RoleRemoved(e) => e.account_id,
        }
    }

    pub fn email(&self) -> &Email {
        match self {
            AccountEvent::Registered(e) => &e.email,
            AccountEvent::Activated(e) => &e.email,
            AccountEvent::Deactivated(e) => &e.email,
            AccountEvent::PasswordChanged(e) => &e.email,
            AccountEvent::RoleAdded(e) => &e.email,
            AccountEvent::RoleRemoved(e) => &e.email,
        }
    }
}

impl Event for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::Registered(_) => "account.registered",
            AccountEvent::Activated(_) => "account.activated",
            AccountEvent::Deactivated(_) => "account.deactivated",
            AccountEvent::PasswordChanged(_) => "account.password_changed",
            AccountEvent::RoleAdded(_) => "account.role_added",
            AccountEvent::RoleRemoved(_) => "account.role_removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::Registered(e) => e.occurred_at,
            AccountEvent::Activated(e) => e.occurred_at,
            AccountEvent::Deactivated(e) => e.occurred_at,
            AccountEvent::PasswordChanged(e) => e.occurred_at,
            AccountEvent::RoleAdded(e) => e.occurred_at,
            AccountEvent::RoleRemoved(e) => e.occurred_at,
        }
    }
}
