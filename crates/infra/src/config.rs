//! Configuration loading: token specification and password policy.
//!
//! Variables (all optional, prefix `IDGATE_`):
//!
//! | variable                          | default |
//! |-----------------------------------|---------|
//! | `IDGATE_JWT_ISSUER`               | `auth`  |
//! | `IDGATE_JWT_AUDIENCE` (comma sep) | `auth`  |
//! | `IDGATE_JWT_ACCESS_TTL_SECONDS`   | `900`   |
//! | `IDGATE_JWT_REFRESH_TTL_SECONDS`  | `86400` |
//! | `IDGATE_JWT_CLOCK_SKEW_SECONDS`   | `30`    |
//! | `IDGATE_PASSWORD_MIN_LENGTH`      | `10`    |
//! | `IDGATE_PASSWORD_MAX_LENGTH`      | `100`   |

use core::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use idgate_auth::{PasswordPolicy, TokenSpecification};
use idgate_core::{DomainError, ErrorCode, ErrorContext, Ttl};

pub const PREFIX: &str = "IDGATE_";

const DEFAULT_ISSUER: &str = "auth";
const DEFAULT_AUDIENCE: &str = "auth";
const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_CLOCK_SKEW_SECONDS: i64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}: {reason}")]
    Malformed {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{key}: {source}")]
    Invalid {
        key: String,
        #[source]
        source: DomainError,
    },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        "config_error"
    }

    fn context(&self) -> ErrorContext {
        let mut ctx = ErrorContext::new();
        match self {
            ConfigError::Malformed { key, value, .. } => {
                ctx.insert("key".into(), key.as_str().into());
                ctx.insert("value".into(), value.as_str().into());
            }
            ConfigError::Invalid { key, .. } => {
                ctx.insert("key".into(), key.as_str().into());
            }
        }
        ctx
    }
}

/// Everything the auth core needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthSettings {
    pub token: TokenSpecification,
    #[serde(default)]
    pub password: PasswordPolicy,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token: default_token_spec(),
            password: PasswordPolicy::default(),
        }
    }
}

fn default_token_spec() -> TokenSpecification {
    TokenSpecification::new(DEFAULT_ISSUER)
        .with_audience([DEFAULT_AUDIENCE])
        .with_access_ttl(Ttl::from_secs(DEFAULT_ACCESS_TTL_SECONDS).unwrap_or(Ttl::ZERO))
        .with_refresh_ttl(Ttl::from_secs(DEFAULT_REFRESH_TTL_SECONDS).unwrap_or(Ttl::ZERO))
        .with_clock_skew(Ttl::from_secs(DEFAULT_CLOCK_SKEW_SECONDS).unwrap_or(Ttl::ZERO))
}

impl AuthSettings {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`, which maps a full variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };

        let issuer = source.string("JWT_ISSUER", DEFAULT_ISSUER);
        let audience: Vec<String> = source
            .string("JWT_AUDIENCE", DEFAULT_AUDIENCE)
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        let access = source.ttl("JWT_ACCESS_TTL_SECONDS", DEFAULT_ACCESS_TTL_SECONDS)?;
        let refresh = source.ttl("JWT_REFRESH_TTL_SECONDS", DEFAULT_REFRESH_TTL_SECONDS)?;
        let skew = source.ttl("JWT_CLOCK_SKEW_SECONDS", DEFAULT_CLOCK_SKEW_SECONDS)?;

        let defaults = PasswordPolicy::default();
        let password = PasswordPolicy {
            min_length: source.parsed("PASSWORD_MIN_LENGTH", defaults.min_length)?,
            max_length: source.parsed("PASSWORD_MAX_LENGTH", defaults.max_length)?,
            ..defaults
        };
        password.check().map_err(|source| ConfigError::Invalid {
            key: format!("{PREFIX}PASSWORD_MIN_LENGTH"),
            source,
        })?;

        let token = TokenSpecification::new(issuer)
            .with_audience(audience)
            .with_access_ttl(access)
            .with_refresh_ttl(refresh)
            .with_clock_skew(skew);

        Ok(Self { token, password })
    }
}

struct Source<F> {
    lookup: F,
}

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> (String, Option<String>) {
        let key = format!("{PREFIX}{name}");
        let value = (self.lookup)(&key).filter(|v| !v.trim().is_empty());
        (key, value)
    }

    fn string(&self, name: &str, default: &str) -> String {
        match self.raw(name) {
            (_, Some(value)) => value,
            (key, None) => {
                tracing::warn!(key = %key, default, "not set; using default");
                default.to_string()
            }
        }
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + core::fmt::Display,
        T::Err: core::fmt::Display,
    {
        match self.raw(name) {
            (key, Some(value)) => value.trim().parse().map_err(|e: T::Err| ConfigError::Malformed {
                key,
                value,
                reason: e.to_string(),
            }),
            (key, None) => {
                tracing::warn!(key = %key, default = %default, "not set; using default");
                Ok(default)
            }
        }
    }

    fn ttl(&self, name: &str, default_secs: i64) -> Result<Ttl, ConfigError> {
        let secs = self.parsed(name, default_secs)?;
        Ttl::from_secs(secs).map_err(|source| ConfigError::Invalid {
            key: format!("{PREFIX}{name}"),
            source,
        })
    }
}
