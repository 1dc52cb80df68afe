//! Registration: create an account after the password policy accepts it.

use std::sync::Arc;

use idgate_auth::{Account, AccountEvent, Email, Password, PasswordPolicy};
use idgate_core::{AggregateRoot, Clock, SystemClock};
use idgate_events::EventSink;

use crate::error::{ServiceError, ServiceResult};
use crate::ports::PasswordHasher;
use crate::uow::{close, close_with, RepositoryError, UnitOfWork};

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub email: String,
    pub password: Password,
    pub username: Option<String>,
}

impl RegisterCommand {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Password::new(password),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterResult {
    pub account: Account,
}

pub struct RegisterService {
    uow: Arc<dyn UnitOfWork>,
    hasher: Arc<dyn PasswordHasher>,
    policy: PasswordPolicy,
    clock: Arc<dyn Clock>,
    sinks: Vec<Arc<dyn EventSink<AccountEvent>>>,
}

impl RegisterService {
    pub fn new(uow: Arc<dyn UnitOfWork>, hasher: Arc<dyn PasswordHasher>, policy: PasswordPolicy) -> Self {
        Self {
            uow,
            hasher,
            policy,
            clock: Arc::new(SystemClock),
            sinks: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Every registered sink receives every registration event.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink<AccountEvent>>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Two short scopes: an existence check, then the creation. The check is
    /// advisory; the store's unique email constraint decides races, and a
    /// violation there is reported as [`ServiceError::AccountAlreadyExists`].
    ///
    /// The registration event goes to the sinks after the creation commits.
    /// A sink failure at that point is returned as
    /// [`ServiceError::Unexpected`] with the account already stored.
    pub async fn register(&self, cmd: RegisterCommand) -> ServiceResult<RegisterResult> {
        let email = Email::parse(&cmd.email)?;

        let mut scope = self.uow.open().await?;
        let found = scope.accounts().get_by_email(&email).await;
        if close(scope, found.map_err(ServiceError::from)).await?.is_some() {
            tracing::info!(email = %email, "registration rejected: email taken");
            return Err(ServiceError::AccountAlreadyExists { email });
        }

        let decision = self.policy.validate(&cmd.password);
        if !decision.ok() {
            tracing::info!(email = %email, codes = ?decision.codes(), "registration rejected: weak password");
            return Err(ServiceError::PasswordPolicy {
                violations: decision.into_issues(),
            });
        }

        let hash = self.hasher.hash(&cmd.password).await?;
        let mut account = Account::new(email.clone(), hash);
        if let Some(username) = cmd.username {
            account = account.with_username(username);
        }

        let mut scope = self.uow.open().await?;
        let created = scope
            .accounts()
            .create(account)
            .await
            .map_err(|e| creation_error(e, &email));
        let account = close_with(scope, created, |e| creation_error(e, &email)).await?;

        // Only committed accounts are announced.
        if let Err(err) = self.publish(account.registered_event(self.clock.now())) {
            tracing::error!(
                email = %email,
                account_id = ?account.id(),
                error = %err,
                "account stored but registration event not published"
            );
            return Err(err);
        }

        tracing::info!(email = %email, account_id = ?account.id(), "account registered");
        Ok(RegisterResult { account })
    }

    fn publish(&self, event: AccountEvent) -> ServiceResult<()> {
        for sink in &self.sinks {
            sink.publish(event.clone())?;
        }
        Ok(())
    }
}

fn creation_error(err: RepositoryError, email: &Email) -> ServiceError {
    match err {
        RepositoryError::UniqueViolation(_) => ServiceError::AccountAlreadyExists { email: email.clone() },
        other => other.into(),
    }
}

impl core::fmt::Debug for RegisterService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterService")
            .field("policy", &self.policy)
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}
