//! Domain error model.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Structured diagnostic data attached to an error or issue.
pub type ErrorContext = Map<String, Value>;

/// Stable, machine-readable identification of an error.
///
/// Every domain and application error implements this so the boundary layer
/// can log it and map it to a response without matching on message text.
pub trait ErrorCode {
    /// Stable code (e.g. `"invalid_credentials"`).
    fn code(&self) -> &'static str;

    /// Structured context for logging. Empty by default.
    fn context(&self) -> ErrorContext {
        ErrorContext::new()
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A value that must not be negative was negative.
    #[error("{field} should be positive (got {value})")]
    ShouldBePositive { field: &'static str, value: i64 },

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. identifier assigned twice).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn should_be_positive(field: &'static str, value: i64) -> Self {
        Self::ShouldBePositive { field, value }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

impl ErrorCode for DomainError {
    fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::ShouldBePositive { .. } => "value_should_be_positive",
            DomainError::InvariantViolation(_) => "invariant_violation",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound => "not_found",
            DomainError::Conflict(_) => "conflict",
        }
    }

    fn context(&self) -> ErrorContext {
        let mut ctx = ErrorContext::new();
        match self {
            DomainError::Validation(msg)
            | DomainError::InvariantViolation(msg)
            | DomainError::InvalidId(msg)
            | DomainError::Conflict(msg) => {
                ctx.insert("message".into(), json!(msg));
            }
            DomainError::ShouldBePositive { field, value } => {
                ctx.insert("field".into(), json!(field));
                ctx.insert("value".into(), json!(value));
            }
            DomainError::NotFound => {}
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_positive_carries_field_and_value() {
        let err = DomainError::should_be_positive("access_ttl", -5);
        assert_eq!(err.code(), "value_should_be_positive");

        let ctx = err.context();
        assert_eq!(ctx["field"], json!("access_ttl"));
        assert_eq!(ctx["value"], json!(-5));
        assert!(err.to_string().contains("access_ttl"));
    }

    #[test]
    fn not_found_has_empty_context() {
        assert!(DomainError::not_found().context().is_empty());
    }
}
