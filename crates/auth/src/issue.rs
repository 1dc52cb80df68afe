//! Diagnostic units produced by policies, and the verdict built from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use idgate_core::{ErrorContext, ValueObject};

/// Closed set of issue codes.
///
/// Codes are stable, machine-readable strings; new rules add variants here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCode {
    #[serde(rename = "required:sub")]
    RequiredSub,
    #[serde(rename = "required:jti")]
    RequiredJti,
    #[serde(rename = "required:exp")]
    RequiredExp,
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "not_yet_valid")]
    NotYetValid,
    #[serde(rename = "wrong_issuer")]
    WrongIssuer,
    #[serde(rename = "wrong_audience")]
    WrongAudience,

    #[serde(rename = "password:too_short")]
    PasswordTooShort,
    #[serde(rename = "password:too_long")]
    PasswordTooLong,
    #[serde(rename = "password:require_lower")]
    PasswordRequireLower,
    #[serde(rename = "password:require_upper")]
    PasswordRequireUpper,
    #[serde(rename = "password:require_digit")]
    PasswordRequireDigit,
    #[serde(rename = "password:require_symbol")]
    PasswordRequireSymbol,
    #[serde(rename = "password:blacklisted")]
    PasswordBlacklisted,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::RequiredSub => "required:sub",
            IssueCode::RequiredJti => "required:jti",
            IssueCode::RequiredExp => "required:exp",
            IssueCode::Expired => "expired",
            IssueCode::NotYetValid => "not_yet_valid",
            IssueCode::WrongIssuer => "wrong_issuer",
            IssueCode::WrongAudience => "wrong_audience",
            IssueCode::PasswordTooShort => "password:too_short",
            IssueCode::PasswordTooLong => "password:too_long",
            IssueCode::PasswordRequireLower => "password:require_lower",
            IssueCode::PasswordRequireUpper => "password:require_upper",
            IssueCode::PasswordRequireDigit => "password:require_digit",
            IssueCode::PasswordRequireSymbol => "password:require_symbol",
            IssueCode::PasswordBlacklisted => "password:blacklisted",
        }
    }
}

impl core::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How bad an issue is. Only `High` fails a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A single finding from a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    code: IssueCode,
    severity: Severity,

    /// Human-readable description, suitable for showing to the user.
    message: String,

    #[serde(default, skip_serializing_if = "ErrorContext::is_empty")]
    context: ErrorContext,
}

impl Issue {
    pub fn new(code: IssueCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn high(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::High, message)
    }

    /// Attach a diagnostic key/value pair.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn code(&self) -> IssueCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::High
    }
}

impl ValueObject for Issue {}

/// Verdict of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    issues: Vec<Issue>,
}

impl Decision {
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// `true` when no issue is critical. Low/medium issues are advisory.
    pub fn ok(&self) -> bool {
        !self.issues.iter().any(Issue::is_critical)
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn critical(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_critical())
    }

    pub fn codes(&self) -> Vec<IssueCode> {
        self.issues.iter().map(Issue::code).collect()
    }

    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

impl FromIterator<Issue> for Decision {
    fn from_iter<T: IntoIterator<Item = Issue>>(iter: T) -> Self {
        Self::from_issues(iter.into_iter().collect())
    }
}
