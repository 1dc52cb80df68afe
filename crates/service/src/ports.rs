//! Outbound ports: password hashing and token signing.
//!
//! Both are awaited suspension points. The algorithms behind them (bcrypt,
//! HMAC, RSA, ...) live outside this crate.

use serde_json::{Map, Value};
use thiserror::Error;

use idgate_auth::{Password, PasswordHash};

/// One-way password hashing.
#[async_trait::async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &Password) -> anyhow::Result<PasswordHash>;

    /// `Ok(false)` on mismatch; `Err` only when verification could not run.
    async fn verify(&self, password: &Password, hash: &PasswordHash) -> anyhow::Result<bool>;
}

/// The verifier refused a token (bad signature, malformed, unknown key).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TokenRejected(pub String);

impl TokenRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Signer/verifier over plain claim maps.
///
/// `verify` only checks integrity and decodes; expiry, audience and the
/// other claim rules are decided by the claims validator.
#[async_trait::async_trait]
pub trait TokenSigner: Send + Sync {
    async fn sign(&self, claims: Map<String, Value>) -> anyhow::Result<String>;

    async fn verify(&self, token: &str) -> Result<Map<String, Value>, TokenRejected>;
}
