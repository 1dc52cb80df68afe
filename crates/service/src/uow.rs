//! Unit of work: the transactional boundary around account persistence.
//!
//! A scope is opened per logical step, used by exactly one task, and closed
//! with [`close`]: commit on success, rollback on failure, session released
//! either way. Implementations must also roll back a scope that is dropped
//! without being closed.

use core::fmt::Display;

use thiserror::Error;

use idgate_auth::{Account, Email};
use idgate_core::{AccountId, DomainError};

/// Storage-level failure.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write (e.g. duplicate email).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Account collection bound to one session.
#[async_trait::async_trait]
pub trait AccountRepository: Send {
    async fn get_by_email(&mut self, email: &Email) -> Result<Option<Account>, RepositoryError>;

    async fn get_by_id(&mut self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Stage `account` for insertion and return it with its identifier set.
    ///
    /// Fails with [`RepositoryError::UniqueViolation`] if the email is taken.
    async fn create(&mut self, account: Account) -> Result<Account, RepositoryError>;
}

/// One open session.
#[async_trait::async_trait]
pub trait UowScope: Send {
    fn accounts(&mut self) -> &mut dyn AccountRepository;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Factory of scopes. Shared across tasks; scopes are not.
#[async_trait::async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn open(&self) -> Result<Box<dyn UowScope>, RepositoryError>;
}

/// Close `scope` according to `outcome` and hand the outcome back.
///
/// A failed commit replaces a successful outcome. A failed rollback is logged
/// and the first error is kept.
pub async fn close<T, E>(scope: Box<dyn UowScope>, outcome: Result<T, E>) -> Result<T, E>
where
    E: From<RepositoryError> + Display,
{
    close_with(scope, outcome, E::from).await
}

/// [`close`] with a caller-chosen mapping for commit failures.
pub async fn close_with<T, E, F>(
    scope: Box<dyn UowScope>,
    outcome: Result<T, E>,
    on_commit_error: F,
) -> Result<T, E>
where
    E: Display,
    F: FnOnce(RepositoryError) -> E,
{
    match outcome {
        Ok(value) => {
            scope.commit().await.map_err(on_commit_error)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = scope.rollback().await {
                tracing::warn!(error = %rollback_err, cause = %err, "rollback failed");
            }
            Err(err)
        }
    }
}
