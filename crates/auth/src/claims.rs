use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use idgate_core::{DomainError, DomainResult, Timestamp, ValueObject};

use crate::Role;

/// Token claims model (transport-agnostic).
///
/// Registered claims (RFC 7519 §4.1) plus the private claims this service
/// issues. Every claim is optional on the wire; the validation suite decides
/// which ones a usable token must carry.
///
/// Claims are immutable: build them with [`ClaimsBuilder`] (or the claims
/// factory), which enforces `exp >= nbf` when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireClaims")]
pub struct Claims {
    /// Subject: the account identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aud: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iat: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nbf: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exp: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jti: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    roles: Option<Vec<Role>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

/// Private (application-specific) claims attached at issuance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateClaims {
    pub email: Option<String>,
    pub roles: Option<Vec<Role>>,
    pub scope: Option<String>,
}

impl Claims {
    pub fn builder() -> ClaimsBuilder {
        ClaimsBuilder::default()
    }

    pub fn sub(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    pub fn iss(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    pub fn aud(&self) -> Option<&[String]> {
        self.aud.as_deref()
    }

    pub fn iat(&self) -> Option<Timestamp> {
        self.iat
    }

    pub fn nbf(&self) -> Option<Timestamp> {
        self.nbf
    }

    pub fn exp(&self) -> Option<Timestamp> {
        self.exp
    }

    pub fn jti(&self) -> Option<&str> {
        self.jti.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn roles(&self) -> Option<&[Role]> {
        self.roles.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Key-value form handed to the signer. Absent claims are left out.
    pub fn to_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "claims serialized to a non-object: {other}"
            ))),
        }
    }

    /// Rebuild claims from a verifier's decoded payload.
    ///
    /// Unknown keys are ignored. Wrongly-typed values and a window with
    /// `exp < nbf` are validation errors.
    pub fn from_map(map: Map<String, Value>) -> DomainResult<Self> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| DomainError::validation(format!("malformed claims: {e}")))
    }
}

impl ValueObject for Claims {}

/// Builder for [`Claims`].
#[derive(Debug, Clone, Default)]
pub struct ClaimsBuilder {
    inner: WireClaims,
}

impl ClaimsBuilder {
    pub fn sub(mut self, sub: impl Into<String>) -> Self {
        self.inner.sub = Some(sub.into());
        self
    }

    pub fn iss(mut self, iss: impl Into<String>) -> Self {
        self.inner.iss = Some(iss.into());
        self
    }

    pub fn aud<I, S>(mut self, aud: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.aud = Some(aud.into_iter().map(Into::into).collect());
        self
    }

    pub fn iat(mut self, iat: Timestamp) -> Self {
        self.inner.iat = Some(iat);
        self
    }

    pub fn nbf(mut self, nbf: Timestamp) -> Self {
        self.inner.nbf = Some(nbf);
        self
    }

    pub fn exp(mut self, exp: Timestamp) -> Self {
        self.inner.exp = Some(exp);
        self
    }

    pub fn jti(mut self, jti: impl Into<String>) -> Self {
        self.inner.jti = Some(jti.into());
        self
    }

    pub fn private(mut self, private: PrivateClaims) -> Self {
        self.inner.email = private.email;
        self.inner.roles = private.roles;
        self.inner.scope = private.scope;
        self
    }

    pub fn build(self) -> DomainResult<Claims> {
        Claims::try_from(self.inner)
    }

    /// Build claims whose window the caller derived as `exp = nbf + ttl`.
    ///
    /// `ttl` is non-negative and `Timestamp::add` saturates, so `exp >= nbf`
    /// holds by construction.
    pub(crate) fn build_issued(self) -> Claims {
        let w = self.inner;
        debug_assert!(match (w.nbf, w.exp) {
            (Some(nbf), Some(exp)) => exp >= nbf,
            _ => true,
        });

        w.into_claims()
    }
}

/// Unvalidated wire shape. `aud` may be a single string or an array.
#[derive(Debug, Clone, Default, Deserialize)]
struct WireClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    iss: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    aud: Option<Vec<String>>,
    #[serde(default)]
    iat: Option<Timestamp>,
    #[serde(default)]
    nbf: Option<Timestamp>,
    #[serde(default)]
    exp: Option<Timestamp>,
    #[serde(default)]
    jti: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    roles: Option<Vec<Role>>,
    #[serde(default)]
    scope: Option<String>,
}

impl TryFrom<WireClaims> for Claims {
    type Error = DomainError;

    fn try_from(w: WireClaims) -> Result<Self, Self::Error> {
        if let (Some(nbf), Some(exp)) = (w.nbf, w.exp) {
            if exp < nbf {
                return Err(DomainError::validation(format!(
                    "exp ({exp}) precedes nbf ({nbf})"
                )));
            }
        }

        Ok(w.into_claims())
    }
}

impl WireClaims {
    fn into_claims(self) -> Claims {
        Claims {
            sub: self.sub,
            iss: self.iss,
            aud: self.aud,
            iat: self.iat,
            nbf: self.nbf,
            exp: self.exp,
            jti: self.jti,
            email: self.email,
            roles: self.roles,
            scope: self.scope,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(aud)) => Some(vec![aud]),
        Some(OneOrMany::Many(aud)) => Some(aud),
    })
}
