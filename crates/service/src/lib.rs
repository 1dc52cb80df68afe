//! `idgate-service`: login, registration and token checks.
//!
//! Orchestrates the pure pieces of `idgate-auth` around the outbound ports
//! (unit of work, password hasher, token signer, event sinks). Every
//! operation returns `Result<_, ServiceError>`.

pub mod account;
pub mod error;
pub mod login;
pub mod ports;
pub mod register;
pub mod uow;
pub mod validate;

pub use account::AccountService;
pub use error::{ServiceError, ServiceResult};
pub use login::{LoginResult, LoginService};
pub use ports::{PasswordHasher, TokenRejected, TokenSigner};
pub use register::{RegisterCommand, RegisterResult, RegisterService};
pub use uow::{close, close_with, AccountRepository, RepositoryError, UnitOfWork, UowScope};
pub use validate::ClaimsValidator;
