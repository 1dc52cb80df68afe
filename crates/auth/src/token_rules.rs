//! Built-in validation rules for decoded token claims.
//!
//! Every rule reports at most one issue, always with `High` severity. Rules
//! that compare a claim against a reference value stay silent when the claim
//! is absent and the matching presence rule owns that report, so a missing
//! `exp` is reported once (`required:exp`), not twice.

use std::collections::BTreeSet;

use serde_json::json;

use idgate_core::{Timestamp, Ttl};

use crate::claims::Claims;
use crate::issue::{Issue, IssueCode};
use crate::policy::{at_most_one, Issues, Policy, PolicySuite};
use crate::token_spec::{AudienceMatch, TokenSpecification};

/// Token must name its subject.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubRequired;

impl Policy<Claims> for SubRequired {
    fn evaluate<'a>(&'a self, ctx: &'a Claims) -> Issues<'a> {
        at_most_one(move || {
            ctx.sub()
                .is_none_or(|s| s.is_empty())
                .then(|| Issue::high(IssueCode::RequiredSub, "token has no subject"))
        })
    }
}

/// Token must carry an identifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct JtiRequired;

impl Policy<Claims> for JtiRequired {
    fn evaluate<'a>(&'a self, ctx: &'a Claims) -> Issues<'a> {
        at_most_one(move || {
            ctx.jti()
                .is_none_or(|j| j.is_empty())
                .then(|| Issue::high(IssueCode::RequiredJti, "token has no identifier"))
        })
    }
}

/// Token must carry an expiry.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpRequired;

impl Policy<Claims> for ExpRequired {
    fn evaluate<'a>(&'a self, ctx: &'a Claims) -> Issues<'a> {
        at_most_one(move || {
            ctx.exp()
                .is_none()
                .then(|| Issue::high(IssueCode::RequiredExp, "token has no expiry"))
        })
    }
}

/// Token is expired only once `exp + skew < now`.
#[derive(Debug, Clone, Copy)]
pub struct NotExpired {
    now: Timestamp,
    skew: Ttl,
}

impl NotExpired {
    pub fn new(now: Timestamp, skew: Ttl) -> Self {
        Self { now, skew }
    }
}

impl Policy<Claims> for NotExpired {
    fn evaluate<'a>(&'a self, ctx: &'a Claims) -> Issues<'a> {
        at_most_one(move || {
            let exp = ctx.exp()?;
            (exp.add(self.skew) < self.now).then(|| {
                Issue::high(IssueCode::Expired, "token has expired")
                    .with("exp", exp.as_unix())
                    .with("now", self.now.as_unix())
                    .with("skew", self.skew.as_secs())
            })
        })
    }
}

/// Token is not usable yet while `nbf > now + skew`.
#[derive(Debug, Clone, Copy)]
pub struct NotBefore {
    now: Timestamp,
    skew: Ttl,
}

impl NotBefore {
    pub fn new(now: Timestamp, skew: Ttl) -> Self {
        Self { now, skew }
    }
}

impl Policy<Claims> for NotBefore {
    fn evaluate<'a>(&'a self, ctx: &'a Claims) -> Issues<'a> {
        at_most_one(move || {
            let nbf = ctx.nbf()?;
            (nbf > self.now.add(self.skew)).then(|| {
                Issue::high(IssueCode::NotYetValid, "token is not valid yet")
                    .with("nbf", nbf.as_unix())
                    .with("now", self.now.as_unix())
                    .with("skew", self.skew.as_secs())
            })
        })
    }
}

/// Token's `iss` must equal the expected issuer. A missing `iss` is a mismatch.
#[derive(Debug, Clone)]
pub struct IssuerMatches {
    expected: String,
}

impl IssuerMatches {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl Policy<Claims> for IssuerMatches {
    fn evaluate<'a>(&'a self, ctx: &'a Claims) -> Issues<'a> {
        at_most_one(move || {
            (ctx.iss() != Some(self.expected.as_str())).then(|| {
                Issue::high(IssueCode::WrongIssuer, "token was issued by someone else")
                    .with("expected", self.expected.as_str())
                    .with("actual", json!(ctx.iss()))
            })
        })
    }
}

/// Token's `aud` must match the expected audiences under `mode`.
///
/// A token without `aud` never matches a non-empty expectation.
#[derive(Debug, Clone)]
pub struct AudienceMatches {
    expected: BTreeSet<String>,
    mode: AudienceMatch,
}

impl AudienceMatches {
    pub fn new(expected: BTreeSet<String>, mode: AudienceMatch) -> Self {
        Self { expected, mode }
    }

    fn matches(&self, actual: &[String]) -> bool {
        match self.mode {
            AudienceMatch::Intersects => actual.iter().any(|a| self.expected.contains(a)),
            AudienceMatch::Subset => self.expected.iter().all(|e| actual.contains(e)),
        }
    }
}

impl Policy<Claims> for AudienceMatches {
    fn evaluate<'a>(&'a self, ctx: &'a Claims) -> Issues<'a> {
        at_most_one(move || {
            if self.expected.is_empty() {
                return None;
            }
            let actual = ctx.aud().unwrap_or_default();
            (!self.matches(actual)).then(|| {
                Issue::high(IssueCode::WrongAudience, "token is not meant for this audience")
                    .with("expected", json!(self.expected))
                    .with("actual", json!(actual))
                    .with("mode", json!(self.mode))
            })
        })
    }
}

/// Standard validation suite for `spec`, evaluated at `now`.
///
/// Presence rules follow the specification's flags; issuer and audience rules
/// are included only when the specification sets them.
pub fn token_suite(spec: &TokenSpecification, now: Timestamp) -> PolicySuite<Claims> {
    let mut suite = PolicySuite::new();

    if spec.requires_sub() {
        suite.push(SubRequired);
    }
    if spec.requires_jti() {
        suite.push(JtiRequired);
    }
    if spec.requires_exp() {
        suite.push(ExpRequired);
    }

    suite.push(NotExpired::new(now, spec.clock_skew()));
    suite.push(NotBefore::new(now, spec.clock_skew()));

    if let Some(issuer) = spec.issuer() {
        suite.push(IssuerMatches::new(issuer));
    }
    if !spec.audience().is_empty() {
        suite.push(AudienceMatches::new(spec.audience().clone(), spec.audience_match()));
    }

    suite
}
