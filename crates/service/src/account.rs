//! Resolve the account behind an access token.

use std::sync::Arc;

use idgate_auth::Account;
use idgate_core::AccountId;

use crate::error::{ServiceError, ServiceResult};
use crate::ports::TokenSigner;
use crate::uow::{close, UnitOfWork};
use crate::validate::ClaimsValidator;

pub struct AccountService {
    uow: Arc<dyn UnitOfWork>,
    signer: Arc<dyn TokenSigner>,
    validator: Arc<ClaimsValidator>,
}

impl AccountService {
    pub fn new(uow: Arc<dyn UnitOfWork>, signer: Arc<dyn TokenSigner>, validator: Arc<ClaimsValidator>) -> Self {
        Self {
            uow,
            signer,
            validator,
        }
    }

    /// The active account named by the token's subject.
    ///
    /// Token problems surface as `InvalidToken`/`InvalidClaims`; a subject that
    /// is not an account id, no longer exists or is inactive surfaces as
    /// `InvalidCredentials`.
    pub async fn current_account(&self, token: &str) -> ServiceResult<Account> {
        let claims = self.validator.verify_token(self.signer.as_ref(), token).await?;

        let Some(id) = claims.sub().and_then(|s| s.parse::<AccountId>().ok()) else {
            tracing::info!(reason = "foreign_subject", "token does not name an account");
            return Err(ServiceError::InvalidCredentials);
        };

        let mut scope = self.uow.open().await?;
        let found = scope.accounts().get_by_id(id).await;
        match close(scope, found.map_err(ServiceError::from)).await? {
            Some(account) if account.is_active() => Ok(account),
            Some(_) => {
                tracing::info!(account_id = %id, reason = "inactive", "token refused");
                Err(ServiceError::InvalidCredentials)
            }
            None => {
                tracing::info!(account_id = %id, reason = "unknown_account", "token refused");
                Err(ServiceError::InvalidCredentials)
            }
        }
    }
}

impl core::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountService")
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}
