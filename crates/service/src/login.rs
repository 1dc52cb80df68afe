//! Login: authenticate by email and password, issue a token pair.

use std::sync::Arc;

use idgate_auth::{Account, ClaimsFactory, Email, Password, PrivateClaims};
use idgate_core::{AggregateRoot, DomainError};

use crate::error::{ServiceError, ServiceResult};
use crate::ports::{PasswordHasher, TokenSigner};
use crate::uow::{close, UnitOfWork};

/// Signed access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct LoginService {
    uow: Arc<dyn UnitOfWork>,
    hasher: Arc<dyn PasswordHasher>,
    signer: Arc<dyn TokenSigner>,
    factory: ClaimsFactory,
}

impl LoginService {
    pub fn new(
        uow: Arc<dyn UnitOfWork>,
        hasher: Arc<dyn PasswordHasher>,
        signer: Arc<dyn TokenSigner>,
        factory: ClaimsFactory,
    ) -> Self {
        Self {
            uow,
            hasher,
            signer,
            factory,
        }
    }

    /// Every authentication failure is reported as
    /// [`ServiceError::InvalidCredentials`]; the reason only reaches the logs.
    pub async fn login(&self, email: &str, password: &Password) -> ServiceResult<LoginResult> {
        let Ok(email) = Email::parse(email) else {
            tracing::info!(reason = "malformed_email", "login rejected");
            return Err(ServiceError::InvalidCredentials);
        };

        let mut scope = self.uow.open().await?;
        let found = scope.accounts().get_by_email(&email).await;
        let account = close(scope, found.map_err(ServiceError::from)).await?;

        let Some(account) = account else {
            tracing::info!(email = %email, reason = "unknown_email", "login rejected");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.hasher.verify(password, account.password_hash()).await? {
            tracing::info!(email = %email, reason = "wrong_password", "login rejected");
            return Err(ServiceError::InvalidCredentials);
        }

        if !account.is_active() {
            tracing::info!(email = %email, reason = "inactive", "login rejected");
            return Err(ServiceError::InvalidCredentials);
        }

        let result = self.issue(&account).await?;
        tracing::info!(email = %email, "login succeeded");
        Ok(result)
    }

    async fn issue(&self, account: &Account) -> ServiceResult<LoginResult> {
        let id = account
            .id()
            .ok_or_else(|| DomainError::invariant("stored account has no identifier"))?;
        let subject = id.to_string();

        let access = self.factory.access_claims_with(
            &subject,
            None,
            PrivateClaims {
                email: Some(account.email().to_string()),
                roles: Some(account.roles().iter().cloned().collect()),
                scope: None,
            },
        );
        let refresh = self.factory.refresh_claims(&subject, None);

        let access_token = self
            .signer
            .sign(access.to_map().map_err(anyhow::Error::from)?)
            .await?;
        let refresh_token = self
            .signer
            .sign(refresh.to_map().map_err(anyhow::Error::from)?)
            .await?;

        Ok(LoginResult {
            access_token,
            refresh_token,
        })
    }
}

impl core::fmt::Debug for LoginService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginService")
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}
