//! Time value objects: unix-second timestamps and non-negative spans.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Point in time as whole unix seconds (the resolution tokens carry).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_unix(secs: i64) -> Self {
        Self(secs)
    }

    pub const fn as_unix(&self) -> i64 {
        self.0
    }

    /// `self + span`, saturating at the representable bounds.
    pub fn add(self, span: Ttl) -> Self {
        Self(self.0.saturating_add(span.as_secs()))
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp())
    }
}

impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ValueObject for Timestamp {}

/// Non-negative span of time in whole seconds.
///
/// Used for token lifetimes and for the clock-skew tolerance. Construction
/// rejects negative spans with [`DomainError::ShouldBePositive`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Ttl(i64);

impl Ttl {
    pub const ZERO: Ttl = Ttl(0);

    pub fn from_secs(secs: i64) -> DomainResult<Self> {
        if secs < 0 {
            return Err(DomainError::should_be_positive("ttl", secs));
        }
        Ok(Self(secs))
    }

    pub fn from_minutes(minutes: i64) -> DomainResult<Self> {
        Self::from_secs(minutes.saturating_mul(60))
    }

    /// Whole seconds of `delta`; sub-second precision is truncated.
    pub fn from_duration(delta: TimeDelta) -> DomainResult<Self> {
        Self::from_secs(delta.num_seconds())
    }

    pub const fn as_secs(&self) -> i64 {
        self.0
    }

    pub fn as_duration(&self) -> TimeDelta {
        TimeDelta::seconds(self.0)
    }
}

impl TryFrom<i64> for Ttl {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_secs(value)
    }
}

impl From<Ttl> for i64 {
    fn from(value: Ttl) -> Self {
        value.0
    }
}

impl ValueObject for Ttl {}
