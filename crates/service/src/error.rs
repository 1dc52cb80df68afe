//! Application error taxonomy.

use serde_json::{json, Value};
use thiserror::Error;

use idgate_auth::{Email, Issue};
use idgate_core::{DomainError, ErrorCode, ErrorContext};
use idgate_events::PublishError;

use crate::ports::TokenRejected;
use crate::uow::RepositoryError;

/// Everything an orchestration call can fail with.
///
/// Expected business outcomes have their own variant. Infrastructure faults
/// travel unmodified in [`ServiceError::Unexpected`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Unknown email, wrong password or inactive account. Deliberately one
    /// variant so callers cannot tell them apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account with email {email} already exists")]
    AccountAlreadyExists { email: Email },

    #[error("password violates {} rule(s)", violations.len())]
    PasswordPolicy { violations: Vec<Issue> },

    #[error("claims rejected with {} issue(s)", issues.len())]
    InvalidClaims { issues: Vec<Issue> },

    #[error("token rejected: {0}")]
    InvalidToken(#[from] TokenRejected),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Human-readable messages of the violated password rules, in order.
    pub fn violation_messages(&self) -> Vec<&str> {
        match self {
            ServiceError::PasswordPolicy { violations } => {
                violations.iter().map(Issue::message).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn is_unexpected(&self) -> bool {
        matches!(self, ServiceError::Unexpected(_))
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::UniqueViolation(what) => {
                ServiceError::Domain(DomainError::conflict(format!("unique constraint violated: {what}")))
            }
            RepositoryError::Domain(e) => ServiceError::Domain(e),
            RepositoryError::Backend(e) => ServiceError::Unexpected(e),
        }
    }
}

impl From<PublishError> for ServiceError {
    fn from(value: PublishError) -> Self {
        ServiceError::Unexpected(anyhow::Error::new(value).context("publishing account event"))
    }
}

fn issues_context(key: &str, issues: &[Issue]) -> ErrorContext {
    let mut ctx = ErrorContext::new();
    ctx.insert(
        key.into(),
        Value::Array(
            issues
                .iter()
                .map(|i| json!({"code": i.code().as_str(), "message": i.message()}))
                .collect(),
        ),
    );
    ctx
}

impl ErrorCode for ServiceError {
    fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidCredentials => "invalid_credentials",
            ServiceError::AccountAlreadyExists { .. } => "account_already_exists",
            ServiceError::PasswordPolicy { .. } => "password_policy_error",
            ServiceError::InvalidClaims { .. } => "invalid_claims",
            ServiceError::InvalidToken(_) => "invalid_token",
            ServiceError::Domain(e) => e.code(),
            ServiceError::Unexpected(_) => "unexpected_error",
        }
    }

    fn context(&self) -> ErrorContext {
        match self {
            ServiceError::AccountAlreadyExists { email } => {
                let mut ctx = ErrorContext::new();
                ctx.insert("email".into(), email.as_str().into());
                ctx
            }
            ServiceError::PasswordPolicy { violations } => issues_context("violations", violations),
            ServiceError::InvalidClaims { issues } => issues_context("issues", issues),
            ServiceError::Domain(e) => e.context(),
            _ => ErrorContext::new(),
        }
    }
}
