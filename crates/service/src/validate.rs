//! Claims validation against the shared token specification.

use std::sync::Arc;

use idgate_auth::{token_suite, Claims, Decision, Policy, PolicySuite, TokenSpecification};
use idgate_core::{Clock, SystemClock, Timestamp};

use crate::error::{ServiceError, ServiceResult};
use crate::ports::TokenSigner;

/// Decides decoded claims with the standard token suite plus any extra
/// policies registered by the caller.
pub struct ClaimsValidator {
    spec: Arc<TokenSpecification>,
    clock: Arc<dyn Clock>,
    extra: PolicySuite<Claims>,
}

impl ClaimsValidator {
    pub fn new(spec: Arc<TokenSpecification>, clock: Arc<dyn Clock>) -> Self {
        Self {
            spec,
            clock,
            extra: PolicySuite::new(),
        }
    }

    pub fn with_system_clock(spec: Arc<TokenSpecification>) -> Self {
        Self::new(spec, Arc::new(SystemClock))
    }

    /// Register an additional rule; it runs after the standard ones.
    pub fn with_policy<P>(mut self, policy: P) -> Self
    where
        P: Policy<Claims> + 'static,
    {
        self.extra.push(policy);
        self
    }

    pub fn decide(&self, claims: &Claims) -> Decision {
        let now = Timestamp::from(self.clock.now());
        let standard = token_suite(&self.spec, now);

        let decision: Decision = standard
            .evaluate(claims)
            .chain(self.extra.evaluate(claims))
            .collect();
        decision
    }

    pub fn validate(&self, claims: &Claims) -> ServiceResult<()> {
        let decision = self.decide(claims);
        if decision.ok() {
            return Ok(());
        }

        tracing::info!(codes = ?decision.codes(), "claims rejected");
        Err(ServiceError::InvalidClaims {
            issues: decision.into_issues(),
        })
    }

    /// Decode `token` through `verifier`, then validate the claims it carries.
    pub async fn verify_token(&self, verifier: &dyn TokenSigner, token: &str) -> ServiceResult<Claims> {
        let map = verifier.verify(token).await?;
        let claims = Claims::from_map(map)?;
        self.validate(&claims)?;
        Ok(claims)
    }
}

impl core::fmt::Debug for ClaimsValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClaimsValidator")
            .field("spec", &self.spec)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}
