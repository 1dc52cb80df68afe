//! Shared wiring for the service black-box tests.
//!
//! Real services over the in-memory unit of work, a reversible fake hasher and
//! an HS256 signer backed by `jsonwebtoken`.

#![allow(dead_code)]

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

use idgate_auth::{Account, ClaimsFactory, Email, Password, PasswordHash, PasswordPolicy, TokenSpecification};
use idgate_core::{FixedClock, RandomIdGenerator, Ttl};
use idgate_infra::{InMemoryUnitOfWork, OutboxEventSink};
use idgate_service::{
    AccountService, ClaimsValidator, LoginService, PasswordHasher, RegisterService, TokenRejected, TokenSigner,
};

pub const NOW: i64 = 1_700_000_000;
pub const SECRET: &str = "test-secret-do-not-use";
pub const PASSWORD: &str = "Secret1!";

pub struct FakeHasher;

#[async_trait::async_trait]
impl PasswordHasher for FakeHasher {
    async fn hash(&self, password: &Password) -> anyhow::Result<PasswordHash> {
        Ok(PasswordHash::new(format!("fake${}", password.as_str())))
    }

    async fn verify(&self, password: &Password, hash: &PasswordHash) -> anyhow::Result<bool> {
        Ok(hash.as_str() == format!("fake${}", password.as_str()))
    }
}

/// HS256 signer. Only the signature is checked here; claim rules belong to
/// `ClaimsValidator`.
pub struct Hs256Signer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256Signer {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait::async_trait]
impl TokenSigner for Hs256Signer {
    async fn sign(&self, claims: Map<String, Value>) -> anyhow::Result<String> {
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    async fn verify(&self, token: &str) -> Result<Map<String, Value>, TokenRejected> {
        jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenRejected::new(e.to_string()))
    }
}

pub fn spec() -> TokenSpecification {
    TokenSpecification::new("auth")
        .with_audience(["auth"])
        .with_access_ttl(Ttl::from_secs(900).unwrap())
        .with_refresh_ttl(Ttl::from_secs(86_400).unwrap())
        .with_clock_skew(Ttl::from_secs(30).unwrap())
}

/// Defaults apart from a shorter minimum, so `PASSWORD` is acceptable.
pub fn policy() -> PasswordPolicy {
    PasswordPolicy {
        min_length: 8,
        ..PasswordPolicy::default()
    }
}

pub struct App {
    pub uow: InMemoryUnitOfWork,
    pub clock: Arc<FixedClock>,
    pub signer: Arc<Hs256Signer>,
    pub factory: ClaimsFactory,
    pub outbox: Arc<OutboxEventSink>,
    pub login: LoginService,
    pub register: RegisterService,
    pub accounts: AccountService,
}

pub fn app() -> App {
    app_with(spec(), policy())
}

pub fn app_with(spec: TokenSpecification, policy: PasswordPolicy) -> App {
    idgate_observability::init_for_tests();

    let uow = InMemoryUnitOfWork::new();
    let clock = Arc::new(FixedClock::at_unix(NOW));
    let signer = Arc::new(Hs256Signer::new(SECRET));
    let outbox = Arc::new(OutboxEventSink::new());
    let spec = Arc::new(spec);

    let factory = ClaimsFactory::new(Arc::clone(&spec), clock.clone(), Arc::new(RandomIdGenerator)).unwrap();
    let validator = Arc::new(ClaimsValidator::new(Arc::clone(&spec), clock.clone()));

    let login = LoginService::new(Arc::new(uow.clone()), Arc::new(FakeHasher), signer.clone(), factory.clone());
    let register = RegisterService::new(Arc::new(uow.clone()), Arc::new(FakeHasher), policy)
        .with_clock(clock.clone())
        .with_sink(outbox.clone());
    let accounts = AccountService::new(Arc::new(uow.clone()), signer.clone(), validator);

    App {
        uow,
        clock,
        signer,
        factory,
        outbox,
        login,
        register,
        accounts,
    }
}

impl App {
    /// Store an account directly, hashed the way `FakeHasher` expects.
    pub fn seed(&self, email: &str, password: &str, is_active: bool) -> Account {
        let account = Account::new_with_status(
            Email::parse(email).unwrap(),
            PasswordHash::new(format!("fake${password}")),
            is_active,
        );
        self.uow.seed(account).unwrap()
    }

    pub async fn sign(&self, claims: &idgate_auth::Claims) -> String {
        self.signer.sign(claims.to_map().unwrap()).await.unwrap()
    }
}
