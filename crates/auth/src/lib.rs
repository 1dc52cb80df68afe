//! `idgate-auth`: claims, policy engine and the account aggregate.
//!
//! Everything here is synchronous and free of IO: token issuance and
//! validation only read an injected clock and id source, and the account
//! aggregate hands back events instead of calling out to infrastructure.

pub mod account;
pub mod claims;
pub mod credentials;
pub mod events;
pub mod factory;
pub mod issue;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token_rules;
pub mod token_spec;

pub use account::Account;
pub use claims::{Claims, ClaimsBuilder, PrivateClaims};
pub use credentials::{Email, Password, PasswordHash};
pub use events::AccountEvent;
pub use factory::ClaimsFactory;
pub use issue::{Decision, Issue, IssueCode, Severity};
pub use password::PasswordPolicy;
pub use policy::{at_most_one, policy_fn, Issues, Policy, PolicySuite};
pub use roles::Role;
pub use token_rules::token_suite;
pub use token_spec::{AudienceMatch, TokenConfigError, TokenSpecification};
