//! Password policy: independent rules over a candidate [`Password`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use idgate_core::{DomainError, DomainResult};

use crate::credentials::Password;
use crate::issue::{Decision, Issue, IssueCode};
use crate::policy::{at_most_one, Issues, Policy, PolicySuite};

/// Characters accepted by [`RequireSymbol`].
pub const SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|`~";

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct MinLength(pub usize);

impl Policy<Password> for MinLength {
    fn evaluate<'a>(&'a self, ctx: &'a Password) -> Issues<'a> {
        at_most_one(move || {
            let len = ctx.char_count();
            (len < self.0).then(|| {
                Issue::high(
                    IssueCode::PasswordTooShort,
                    format!("password must be at least {} characters", self.0),
                )
                .with("min", self.0)
                .with("actual", len)
            })
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MaxLength(pub usize);

impl Policy<Password> for MaxLength {
    fn evaluate<'a>(&'a self, ctx: &'a Password) -> Issues<'a> {
        at_most_one(move || {
            let len = ctx.char_count();
            (len > self.0).then(|| {
                Issue::high(
                    IssueCode::PasswordTooLong,
                    format!("password must be at most {} characters", self.0),
                )
                .with("max", self.0)
                .with("actual", len)
            })
        })
    }
}

/// Shared shape of the character-class rules.
fn require_class<'a>(
    ctx: &'a Password,
    code: IssueCode,
    message: &'static str,
    pred: fn(char) -> bool,
) -> Issues<'a> {
    at_most_one(move || (!ctx.chars().any(pred)).then(|| Issue::high(code, message)))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RequireLower;

impl Policy<Password> for RequireLower {
    fn evaluate<'a>(&'a self, ctx: &'a Password) -> Issues<'a> {
        require_class(
            ctx,
            IssueCode::PasswordRequireLower,
            "password must contain a lowercase letter",
            char::is_lowercase,
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RequireUpper;

impl Policy<Password> for RequireUpper {
    fn evaluate<'a>(&'a self, ctx: &'a Password) -> Issues<'a> {
        require_class(
            ctx,
            IssueCode::PasswordRequireUpper,
            "password must contain an uppercase letter",
            char::is_uppercase,
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RequireDigit;

impl Policy<Password> for RequireDigit {
    fn evaluate<'a>(&'a self, ctx: &'a Password) -> Issues<'a> {
        require_class(
            ctx,
            IssueCode::PasswordRequireDigit,
            "password must contain a digit",
            |c| c.is_ascii_digit(),
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RequireSymbol;

impl Policy<Password> for RequireSymbol {
    fn evaluate<'a>(&'a self, ctx: &'a Password) -> Issues<'a> {
        require_class(
            ctx,
            IssueCode::PasswordRequireSymbol,
            "password must contain a symbol",
            |c| SYMBOLS.contains(c),
        )
    }
}

/// Rejects well-known passwords. Comparison is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct NotInBlacklist {
    banned: BTreeSet<String>,
}

impl NotInBlacklist {
    pub fn new<I, S>(banned: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            banned: banned.into_iter().map(|s| s.as_ref().to_lowercase()).collect(),
        }
    }
}

impl Policy<Password> for NotInBlacklist {
    fn evaluate<'a>(&'a self, ctx: &'a Password) -> Issues<'a> {
        at_most_one(move || {
            self.banned
                .contains(&ctx.as_str().to_lowercase())
                .then(|| Issue::high(IssueCode::PasswordBlacklisted, "password is too common"))
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policy configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configured password rules.
///
/// Deserialized policies are checked like [`PasswordPolicy::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyDocument")]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_lower: bool,
    pub require_upper: bool,
    pub require_digit: bool,
    pub require_symbol: bool,
    pub blacklist: BTreeSet<String>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 100,
            require_lower: true,
            require_upper: true,
            require_digit: true,
            require_symbol: true,
            blacklist: ["password", "qwerty", "12345"].map(String::from).into(),
        }
    }
}

/// Unchecked shape of a password policy in a config document.
#[derive(Deserialize)]
#[serde(default)]
struct PolicyDocument {
    min_length: usize,
    max_length: usize,
    require_lower: bool,
    require_upper: bool,
    require_digit: bool,
    require_symbol: bool,
    blacklist: BTreeSet<String>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        let PasswordPolicy {
            min_length,
            max_length,
            require_lower,
            require_upper,
            require_digit,
            require_symbol,
            blacklist,
        } = PasswordPolicy::default();
        Self {
            min_length,
            max_length,
            require_lower,
            require_upper,
            require_digit,
            require_symbol,
            blacklist,
        }
    }
}

impl TryFrom<PolicyDocument> for PasswordPolicy {
    type Error = DomainError;

    fn try_from(doc: PolicyDocument) -> Result<Self, Self::Error> {
        let policy = Self {
            min_length: doc.min_length,
            max_length: doc.max_length,
            require_lower: doc.require_lower,
            require_upper: doc.require_upper,
            require_digit: doc.require_digit,
            require_symbol: doc.require_symbol,
            blacklist: doc
                .blacklist
                .into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        };
        policy.check()?;
        Ok(policy)
    }
}

impl PasswordPolicy {
    /// Length bounds only; every other rule off.
    pub fn length_only(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            require_lower: false,
            require_upper: false,
            require_digit: false,
            require_symbol: false,
            blacklist: BTreeSet::new(),
        }
    }

    /// A policy whose minimum exceeds its maximum accepts nothing.
    pub fn check(&self) -> DomainResult<()> {
        if self.min_length > self.max_length {
            return Err(DomainError::validation(format!(
                "password min length {} exceeds max length {}",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }

    /// Compose the enabled rules, in the order they are reported.
    pub fn suite(&self) -> PolicySuite<Password> {
        let mut suite = PolicySuite::new()
            .with(MinLength(self.min_length))
            .with(MaxLength(self.max_length));

        if self.require_lower {
            suite.push(RequireLower);
        }
        if self.require_upper {
            suite.push(RequireUpper);
        }
        if self.require_digit {
            suite.push(RequireDigit);
        }
        if self.require_symbol {
            suite.push(RequireSymbol);
        }
        if !self.blacklist.is_empty() {
            suite.push(NotInBlacklist::new(&self.blacklist));
        }
        suite
    }

    /// Every violated rule, not just the first.
    pub fn validate(&self, password: &Password) -> Decision {
        self.suite().decide(password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_passes_defaults() {
        let decision = PasswordPolicy::default().validate(&Password::new("Corr3ct-Horse!"));
        assert!(decision.ok(), "{:?}", decision.codes());
    }

    #[test]
    fn short_password_reports_only_the_length_rule() {
        let policy = PasswordPolicy::length_only(8, 100);
        let decision = policy.validate(&Password::new("a"));

        assert_eq!(decision.codes(), vec![IssueCode::PasswordTooShort]);
        assert_eq!(decision.issues()[0].context()["min"], 8);
    }

    #[test]
    fn all_violations_are_collected() {
        let decision = PasswordPolicy::default().validate(&Password::new("qwerty"));

        assert_eq!(
            decision.codes(),
            vec![
                IssueCode::PasswordTooShort,
                IssueCode::PasswordRequireUpper,
                IssueCode::PasswordRequireDigit,
                IssueCode::PasswordRequireSymbol,
                IssueCode::PasswordBlacklisted,
            ]
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let policy = PasswordPolicy::length_only(3, 3);
        assert!(policy.validate(&Password::new("äöü")).ok());
        assert!(policy.validate(&Password::new("äöüß")).has(IssueCode::PasswordTooLong));
    }

    #[test]
    fn blacklist_ignores_case() {
        let rule = NotInBlacklist::new(["Password"]);
        assert_eq!(rule.evaluate(&Password::new("PASSWORD")).count(), 1);
        assert_eq!(rule.evaluate(&Password::new("passw0rd")).count(), 0);
    }

    #[test]
    fn symbols_cover_quotes_and_backslash() {
        for c in ['"', '\'', '\\', '`', '~', '|'] {
            let pw = Password::new(c.to_string());
            assert_eq!(RequireSymbol.evaluate(&pw).count(), 0, "{c}");
        }
        assert_eq!(RequireSymbol.evaluate(&Password::new("abc")).count(), 1);
    }

    #[test]
    fn deserializes_partial_config_over_defaults() {
        let policy: PasswordPolicy = serde_json::from_str(r#"{"min_length": 12}"#).unwrap();
        assert_eq!(policy.min_length, 12);
        assert_eq!(policy.max_length, 100);
        assert!(policy.blacklist.contains("qwerty"));
    }

    #[test]
    fn inverted_bounds_in_config_are_rejected() {
        let parsed = serde_json::from_str::<PasswordPolicy>(r#"{"min_length": 50, "max_length": 20}"#);
        let err = parsed.unwrap_err().to_string();
        assert!(err.contains("min length 50 exceeds max length 20"), "{err}");

        assert!(PasswordPolicy::length_only(8, 8).check().is_ok());
        assert!(PasswordPolicy::length_only(9, 8).check().is_err());
    }

    #[test]
    fn configured_blacklist_is_normalized() {
        let policy: PasswordPolicy = serde_json::from_str(r#"{"blacklist": [" Hunter2 ", ""]}"#).unwrap();
        assert_eq!(policy.blacklist, BTreeSet::from(["hunter2".to_string()]));
    }
}
