//! Account aggregate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use idgate_core::{AccountId, AggregateRoot, DomainError, DomainResult};

use crate::credentials::{Email, PasswordHash};
use crate::events::{
    AccountActivated, AccountDeactivated, AccountEvent, AccountPasswordChanged, AccountRegistered,
    AccountRoleAdded, AccountRoleRemoved,
};
use crate::roles::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Account Aggregate
// ─────────────────────────────────────────────────────────────────────────────

/// Account aggregate root.
///
/// # Invariants
/// - The email never changes after creation.
/// - The identifier is absent until the persistence boundary assigns it, and
///   is assigned at most once.
/// - Every mutator checks its precondition first; on failure it returns an
///   error and leaves the account untouched.
/// - Every successful mutation returns exactly one [`AccountEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: Option<AccountId>,
    email: Email,
    password_hash: PasswordHash,
    is_active: bool,
    username: Option<String>,
    roles: BTreeSet<Role>,
}

impl Account {
    /// New, active, not yet persisted account with no roles.
    pub fn new(email: Email, password_hash: PasswordHash) -> Self {
        Self::new_with_status(email, password_hash, true)
    }

    pub fn new_with_status(email: Email, password_hash: PasswordHash, is_active: bool) -> Self {
        Self {
            id: None,
            email,
            password_hash,
            is_active,
            username: None,
            roles: BTreeSet::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        self.username = (!username.trim().is_empty()).then_some(username);
        self
    }

    /// Rehydrate a persisted account.
    pub fn restore(
        id: AccountId,
        email: Email,
        password_hash: PasswordHash,
        is_active: bool,
        username: Option<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            id: Some(id),
            email,
            password_hash,
            is_active,
            username,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Called by the persistence boundary when the account is stored.
    pub fn assign_id(&mut self, id: AccountId) -> DomainResult<()> {
        if let Some(existing) = self.id {
            return Err(DomainError::conflict(format!(
                "account already has identifier {existing}"
            )));
        }
        self.id = Some(id);
        Ok(())
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if !self.is_active {
            return Err(DomainError::invariant("account is inactive"));
        }
        Ok(())
    }
}

impl AggregateRoot for Account {
    type Id = AccountId;
    type Event = AccountEvent;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Behaviour
// ─────────────────────────────────────────────────────────────────────────────

impl Account {
    /// The registration fact for a freshly created account.
    pub fn registered_event(&self, occurred_at: DateTime<Utc>) -> AccountEvent {
        AccountEvent::Registered(AccountRegistered {
            account_id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            occurred_at,
        })
    }

    pub fn activate(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<AccountEvent> {
        if self.is_active {
            return Err(DomainError::invariant("account already active"));
        }

        self.is_active = true;
        Ok(AccountEvent::Activated(AccountActivated {
            account_id: self.id,
            email: self.email.clone(),
            occurred_at,
        }))
    }

    pub fn deactivate(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<AccountEvent> {
        if !self.is_active {
            return Err(DomainError::invariant("account already inactive"));
        }

        self.is_active = false;
        Ok(AccountEvent::Deactivated(AccountDeactivated {
            account_id: self.id,
            email: self.email.clone(),
            occurred_at,
        }))
    }

    pub fn change_password(
        &mut self,
        new_hash: PasswordHash,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<AccountEvent> {
        self.ensure_active()?;

        self.password_hash = new_hash;
        Ok(AccountEvent::PasswordChanged(AccountPasswordChanged {
            account_id: self.id,
            email: self.email.clone(),
            occurred_at,
        }))
    }

    pub fn add_role(&mut self, role: Role, occurred_at: DateTime<Utc>) -> DomainResult<AccountEvent> {
        if self.roles.contains(&role) {
            return Err(DomainError::invariant(format!("role '{role}' already assigned")));
        }

        self.roles.insert(role.clone());
        Ok(AccountEvent::RoleAdded(AccountRoleAdded {
            account_id: self.id,
            email: self.email.clone(),
            role,
            occurred_at,
        }))
    }

    pub fn remove_role(&mut self, role: &Role, occurred_at: DateTime<Utc>) -> DomainResult<AccountEvent> {
        if !self.roles.remove(role) {
            return Err(DomainError::invariant(format!("role '{role}' not assigned")));
        }

        Ok(AccountEvent::RoleRemoved(AccountRoleRemoved {
            account_id: self.id,
            email: self.email.clone(),
            role: role.clone(),
            occurred_at,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use idgate_events::Event;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn account() -> Account {
        Account::new(Email::parse("a@b.com").unwrap(), PasswordHash::new("h1"))
    }

    #[test]
    fn new_account_is_active_unpersisted_and_roleless() {
        let acc = account();
        assert!(acc.is_active());
        assert!(!acc.is_persisted());
        assert!(acc.roles().is_empty());
        assert_eq!(acc.username(), None);
    }

    #[test]
    fn deactivate_twice_fails_without_mutation() {
        let mut acc = account();
        let event = acc.deactivate(now()).unwrap();
        assert_eq!(event.event_type(), "account.deactivated");

        let before = acc.clone();
        let err = acc.deactivate(now()).unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(msg) if msg.contains("inactive")));
        assert_eq!(acc, before);
    }

    #[test]
    fn activate_requires_inactive() {
        let mut acc = account();
        assert!(acc.activate(now()).is_err());

        let mut acc = Account::new_with_status(Email::parse("a@b.com").unwrap(), PasswordHash::new("h"), false);
        assert_eq!(acc.activate(now()).unwrap().event_type(), "account.activated");
        assert!(acc.is_active());
    }

    #[test]
    fn change_password_on_inactive_keeps_old_hash() {
        let mut acc = account();
        acc.deactivate(now()).unwrap();

        let err = acc.change_password(PasswordHash::new("h2"), now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(acc.password_hash().as_str(), "h1");
    }

    #[test]
    fn change_password_replaces_hash_and_emits_one_event() {
        let mut acc = account();
        let event = acc.change_password(PasswordHash::new("h2"), now()).unwrap();

        assert!(matches!(event, AccountEvent::PasswordChanged(_)));
        assert_eq!(acc.password_hash().as_str(), "h2");
    }

    #[test]
    fn duplicate_role_add_and_missing_role_remove_fail() {
        let mut acc = account();
        let admin = Role::new("admin");

        acc.add_role(admin.clone(), now()).unwrap();
        assert!(acc.add_role(Role::new(" Admin "), now()).is_err());
        assert_eq!(acc.roles().len(), 1);

        let event = acc.remove_role(&admin, now()).unwrap();
        assert!(matches!(&event, AccountEvent::RoleRemoved(e) if e.role == admin));
        assert!(acc.remove_role(&admin, now()).is_err());
    }

    #[test]
    fn identifier_is_assigned_once() {
        let mut acc = account();
        let id = AccountId::new();

        acc.assign_id(id).unwrap();
        assert_eq!(acc.id(), Some(&id));

        let err = acc.assign_id(AccountId::new()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(acc.id(), Some(&id));
    }

    #[test]
    fn registered_event_carries_current_identity() {
        let mut acc = account().with_username("alice");
        let id = AccountId::new();
        acc.assign_id(id).unwrap();

        let AccountEvent::Registered(e) = acc.registered_event(now()) else {
            panic!("expected AccountRegistered");
        };
        assert_eq!(e.account_id, Some(id));
        assert_eq!(e.email.as_str(), "a@b.com");
        assert_eq!(e.username.as_deref(), Some("alice"));
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = account().registered_event(now());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "registered");
        assert_eq!(json["email"], "a@b.com");
    }
}
