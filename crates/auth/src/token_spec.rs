//! Token specification: the single source of truth shared by issuance and
//! validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use idgate_core::{ErrorCode, ErrorContext, Ttl, ValueObject};

/// How a token's `aud` is compared against the specification's audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceMatch {
    /// Valid if the token names at least one of the expected audiences.
    #[default]
    Intersects,
    /// Valid only if the token names every expected audience.
    Subset,
}

/// Misconfiguration detected when a specification is put to use.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    #[error("token specification is missing {0}")]
    MissingTtl(&'static str),
}

impl ErrorCode for TokenConfigError {
    fn code(&self) -> &'static str {
        "token_config_error"
    }

    fn context(&self) -> ErrorContext {
        let mut ctx = ErrorContext::new();
        match self {
            TokenConfigError::MissingTtl(field) => {
                ctx.insert("missing".into(), (*field).into());
            }
        }
        ctx
    }
}

/// Issuer, audience, lifetimes, skew and required-claim flags.
///
/// Built once at startup and shared read-only (`Arc`) by the claims factory
/// and the validation suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpecification {
    #[serde(default)]
    issuer: String,
    #[serde(default, deserialize_with = "non_blank_audience")]
    audience: BTreeSet<String>,

    #[serde(default)]
    access_ttl: Option<Ttl>,
    #[serde(default)]
    refresh_ttl: Option<Ttl>,
    #[serde(default = "default_skew")]
    clock_skew: Ttl,

    #[serde(default = "yes")]
    require_sub: bool,
    #[serde(default = "yes")]
    require_jti: bool,
    #[serde(default = "yes")]
    require_exp: bool,

    #[serde(default)]
    audience_match: AudienceMatch,
}

fn is_audience(a: &str) -> bool {
    !a.trim().is_empty()
}

fn non_blank_audience<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let audience = BTreeSet::<String>::deserialize(deserializer)?;
    Ok(audience.into_iter().filter(|a: &String| is_audience(a)).collect())
}

fn default_skew() -> Ttl {
    Ttl::ZERO
}

fn yes() -> bool {
    true
}

impl TokenSpecification {
    /// Specification with no lifetimes, zero skew and every presence rule on.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: BTreeSet::new(),
            access_ttl: None,
            refresh_ttl: None,
            clock_skew: Ttl::ZERO,
            require_sub: true,
            require_jti: true,
            require_exp: true,
            audience_match: AudienceMatch::default(),
        }
    }

    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience
            .into_iter()
            .map(Into::into)
            .filter(|a: &String| is_audience(a))
            .collect();
        self
    }

    pub fn with_access_ttl(mut self, ttl: Ttl) -> Self {
        self.access_ttl = Some(ttl);
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Ttl) -> Self {
        self.refresh_ttl = Some(ttl);
        self
    }

    pub fn with_clock_skew(mut self, skew: Ttl) -> Self {
        self.clock_skew = skew;
        self
    }

    pub fn with_audience_match(mut self, mode: AudienceMatch) -> Self {
        self.audience_match = mode;
        self
    }

    pub fn require_sub(mut self, required: bool) -> Self {
        self.require_sub = required;
        self
    }

    pub fn require_jti(mut self, required: bool) -> Self {
        self.require_jti = required;
        self
    }

    pub fn require_exp(mut self, required: bool) -> Self {
        self.require_exp = required;
        self
    }

    /// Issuer, or `None` when unset (the claim is then omitted and not checked).
    pub fn issuer(&self) -> Option<&str> {
        let issuer = self.issuer.trim();
        (!issuer.is_empty()).then_some(issuer)
    }

    pub fn audience(&self) -> &BTreeSet<String> {
        &self.audience
    }

    pub fn access_ttl(&self) -> Option<Ttl> {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Option<Ttl> {
        self.refresh_ttl
    }

    pub fn access_ttl_seconds(&self) -> Option<i64> {
        self.access_ttl.map(|t| t.as_secs())
    }

    pub fn refresh_ttl_seconds(&self) -> Option<i64> {
        self.refresh_ttl.map(|t| t.as_secs())
    }

    pub fn clock_skew(&self) -> Ttl {
        self.clock_skew
    }

    pub fn requires_sub(&self) -> bool {
        self.require_sub
    }

    pub fn requires_jti(&self) -> bool {
        self.require_jti
    }

    pub fn requires_exp(&self) -> bool {
        self.require_exp
    }

    pub fn audience_match(&self) -> AudienceMatch {
        self.audience_match
    }

    /// Both lifetimes, or the first one missing.
    pub fn lifetimes(&self) -> Result<(Ttl, Ttl), TokenConfigError> {
        let access = self.access_ttl.ok_or(TokenConfigError::MissingTtl("access_ttl"))?;
        let refresh = self.refresh_ttl.ok_or(TokenConfigError::MissingTtl("refresh_ttl"))?;
        Ok((access, refresh))
    }
}

impl ValueObject for TokenSpecification {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_helpers_report_whole_seconds() {
        let spec = TokenSpecification::new("auth")
            .with_access_ttl(Ttl::from_minutes(15).unwrap())
            .with_refresh_ttl(Ttl::from_secs(86_400).unwrap());

        assert_eq!(spec.access_ttl_seconds(), Some(900));
        assert_eq!(spec.refresh_ttl_seconds(), Some(86_400));
    }

    #[test]
    fn missing_lifetimes_are_reported_by_name() {
        let spec = TokenSpecification::new("auth").with_refresh_ttl(Ttl::ZERO);
        assert_eq!(spec.lifetimes(), Err(TokenConfigError::MissingTtl("access_ttl")));

        let spec = TokenSpecification::new("auth").with_access_ttl(Ttl::ZERO);
        assert_eq!(spec.lifetimes(), Err(TokenConfigError::MissingTtl("refresh_ttl")));
    }

    #[test]
    fn blank_issuer_and_audiences_count_as_unset() {
        let spec = TokenSpecification::new("  ").with_audience(["", "api"]);
        assert_eq!(spec.issuer(), None);
        assert_eq!(spec.audience().len(), 1);
    }

    #[test]
    fn deserializes_with_defaults() {
        let spec: TokenSpecification = serde_json::from_str(
            r#"{"issuer":"auth","audience":["api"],"access_ttl":900,"refresh_ttl":86400}"#,
        )
        .unwrap();

        assert!(spec.requires_sub() && spec.requires_jti() && spec.requires_exp());
        assert_eq!(spec.clock_skew(), Ttl::ZERO);
        assert_eq!(spec.audience_match(), AudienceMatch::Intersects);
        assert!(spec.lifetimes().is_ok());
    }

    #[test]
    fn blank_audiences_in_config_are_dropped() {
        let spec: TokenSpecification =
            serde_json::from_str(r#"{"issuer":"auth","audience":["", "  ", "api"]}"#).unwrap();
        assert_eq!(spec.audience().iter().collect::<Vec<_>>(), vec!["api"]);

        let spec: TokenSpecification = serde_json::from_str(r#"{"audience":[""]}"#).unwrap();
        assert!(spec.audience().is_empty());
    }

    #[test]
    fn negative_lifetime_in_config_is_rejected() {
        let parsed = serde_json::from_str::<TokenSpecification>(r#"{"access_ttl":-1}"#);
        assert!(parsed.is_err());
    }
}
