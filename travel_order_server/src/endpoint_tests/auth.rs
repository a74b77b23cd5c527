use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use travel_order_engine::{
    db_types::{Permission, User},
    AuthApi,
    AuthApiError,
};

use super::{
    helpers::{get_auth_config, get_request, issue_token, post_request, test_user},
    mocks::MockBackend,
};
use crate::{
    auth::TokenIssuer,
    helpers::hash_password,
    routes::{LoginRoute, MeRoute, RegisterRoute},
};

fn configure_register(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_create_user().returning(|new_user| {
        Ok(User {
            id: 10,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            permissions: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap(),
        })
    });
    cfg.service(RegisterRoute::<MockBackend>::new()).app_data(web::Data::new(AuthApi::new(backend)));
}

#[actix_web::test]
async fn register_creates_an_account_and_issues_a_token() {
    let _ = env_logger::try_init().ok();
    let body = json!({"name": "Alice", "email": "alice@example.com", "password": "correct-horse"});
    let (status, body) = post_request("", "/register", &body, configure_register).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["user"]["email"], "alice@example.com");
    assert_eq!(response["user"]["permissions"], json!([]));
    assert_eq!(response["token_type"], "bearer");
    assert_eq!(response["expires_in"], 3600);
    // The token is valid and addressed to the new account.
    let token = response["access_token"].as_str().unwrap();
    let claims = TokenIssuer::new(&get_auth_config()).validate_token(token).unwrap();
    assert_eq!(claims.sub, 10);
}

#[actix_web::test]
async fn register_rejects_short_passwords() {
    let _ = env_logger::try_init().ok();
    let body = json!({"name": "Alice", "email": "alice@example.com", "password": "short"});
    let err = post_request("", "/register", &body, configure_register).await.expect_err("Expected error");
    assert_eq!(err, "The password must be at least 8 characters");
}

#[actix_web::test]
async fn register_rejects_duplicate_emails() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockBackend::new();
        backend
            .expect_create_user()
            .returning(|new_user| Err(AuthApiError::EmailTaken(new_user.email)));
        cfg.service(RegisterRoute::<MockBackend>::new()).app_data(web::Data::new(AuthApi::new(backend)));
    }
    let body = json!({"name": "Alice", "email": "alice@example.com", "password": "correct-horse"});
    let err = post_request("", "/register", &body, configure).await.expect_err("Expected error");
    assert_eq!(err, "The email alice@example.com is already registered");
}

fn configure_login(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_email().returning(|email| {
        if email == "alice@example.com" {
            let mut user = test_user(5, vec![]);
            user.email = email.to_string();
            user.password_hash = hash_password("correct-horse").unwrap();
            Ok(Some(user))
        } else {
            Ok(None)
        }
    });
    cfg.service(LoginRoute::<MockBackend>::new()).app_data(web::Data::new(AuthApi::new(backend)));
}

#[actix_web::test]
async fn login_exchanges_credentials_for_a_token() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "alice@example.com", "password": "correct-horse"});
    let (status, body) = post_request("", "/login", &body, configure_login).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    let token = response["access_token"].as_str().unwrap();
    let claims = TokenIssuer::new(&get_auth_config()).validate_token(token).unwrap();
    assert_eq!(claims.sub, 5);
    assert_eq!(response["token_type"], "bearer");
}

#[actix_web::test]
async fn login_rejects_a_wrong_password() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "alice@example.com", "password": "incorrect-horse"});
    let err = post_request("", "/login", &body, configure_login).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. Invalid email or password.");
}

#[actix_web::test]
async fn login_does_not_reveal_unknown_emails() {
    let _ = env_logger::try_init().ok();
    let body = json!({"email": "mallory@example.com", "password": "correct-horse"});
    let err = post_request("", "/login", &body, configure_login).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. Invalid email or password.");
}

fn configure_me(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_id().returning(|id| Ok(Some(test_user(id, vec![Permission::ViewOrders]))));
    cfg.service(MeRoute::<MockBackend>::new()).app_data(web::Data::new(AuthApi::new(backend)));
}

#[actix_web::test]
async fn me_returns_the_live_account() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&test_user(5, vec![]));
    let (status, body) = get_request(&token, "/me", configure_me).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["id"], 5);
    assert_eq!(response["email"], "user-5@example.com");
    // Permissions come from the store, not from the (older) token.
    assert_eq!(response["permissions"], json!(["view-orders"]));
    assert!(response.get("password_hash").is_none());
}

#[actix_web::test]
async fn me_requires_a_token() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/me", configure_me).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. Auth token not provided.");
}

#[actix_web::test]
async fn me_rejects_tampered_tokens() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token(&test_user(5, vec![]));
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let err = get_request(&token, "/me", configure_me).await.expect_err("Expected error");
    assert!(err.starts_with("Authentication Error. Access token is invalid."), "{err}");
}
