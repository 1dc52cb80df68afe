//! Login over real adapters: in-memory unit of work, HS256 tokens.

mod common;

use idgate_auth::{Claims, Password};
use idgate_core::{AggregateRoot, ErrorCode};
use idgate_service::{RegisterCommand, ServiceError, TokenSigner};

use common::{app, NOW, PASSWORD};

async fn decode(app: &common::App, token: &str) -> Claims {
    Claims::from_map(app.signer.verify(token).await.unwrap()).unwrap()
}

#[tokio::test]
async fn registered_account_receives_signed_token_pair() {
    let app = app();
    let account = app
        .register
        .register(RegisterCommand::new("a@b.com", PASSWORD))
        .await
        .unwrap()
        .account;

    let tokens = app.login.login("a@b.com", &Password::new(PASSWORD)).await.unwrap();
    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());

    let access = decode(&app, &tokens.access_token).await;
    let subject = account.id().unwrap().to_string();
    assert_eq!(access.sub(), Some(subject.as_str()));
    assert_eq!(access.email(), Some("a@b.com"));
    assert_eq!(access.iss(), Some("auth"));
    assert_eq!(access.iat().map(|t| t.as_unix()), Some(NOW));
    assert_eq!(access.exp().map(|t| t.as_unix()), Some(NOW + 900));

    let refresh = decode(&app, &tokens.refresh_token).await;
    assert_eq!(refresh.sub(), Some(subject.as_str()));
    assert_eq!(refresh.exp().map(|t| t.as_unix()), Some(NOW + 86_400));
    assert_eq!(refresh.email(), None);
    assert_ne!(access.jti(), refresh.jti());
}

#[tokio::test]
async fn email_lookup_ignores_case() {
    let app = app();
    app.seed("a@b.com", PASSWORD, true);

    assert!(app.login.login("A@B.COM", &Password::new(PASSWORD)).await.is_ok());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = app();
    app.seed("a@b.com", PASSWORD, true);

    let wrong = app.login.login("a@b.com", &Password::new("wrong")).await.unwrap_err();
    let unknown = app.login.login("nobody@b.com", &Password::new(PASSWORD)).await.unwrap_err();

    assert!(matches!(wrong, ServiceError::InvalidCredentials));
    assert!(matches!(unknown, ServiceError::InvalidCredentials));
    assert_eq!(wrong.code(), "invalid_credentials");
    assert_eq!(wrong.to_string(), unknown.to_string());
    assert!(wrong.context().is_empty());
}

#[tokio::test]
async fn inactive_account_is_rejected_even_with_the_right_password() {
    let app = app();
    app.seed("idle@b.com", PASSWORD, false);

    let err = app.login.login("idle@b.com", &Password::new(PASSWORD)).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));
}

#[tokio::test]
async fn malformed_email_is_just_invalid_credentials() {
    let app = app();

    let err = app.login.login("not-an-email", &Password::new(PASSWORD)).await.unwrap_err();
    assert_eq!(err.code(), "invalid_credentials");
}

#[tokio::test]
async fn login_is_read_only() {
    let app = app();
    app.seed("a@b.com", PASSWORD, true);

    app.login.login("a@b.com", &Password::new(PASSWORD)).await.unwrap();
    app.login.login("a@b.com", &Password::new("wrong")).await.unwrap_err();

    assert_eq!(app.uow.accounts().len(), 1);
    assert!(app.outbox.is_empty());
}
