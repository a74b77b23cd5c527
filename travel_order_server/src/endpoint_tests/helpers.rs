use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{Duration, TimeZone, Utc};
use serde::Serialize;
use tos_common::Secret;
use travel_order_engine::db_types::{Permission, User};

use crate::{auth::TokenIssuer, config::AuthConfig};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("endpoint-test-signing-secret-0123456789abcdef".to_string()),
        token_ttl: Duration::seconds(3600),
    }
}

pub fn test_user(id: i64, permissions: Vec<Permission>) -> User {
    User {
        id,
        name: format!("user-{id}"),
        email: format!("user-{id}@example.com"),
        password_hash: "not-a-real-hash".to_string(),
        permissions,
        created_at: Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap(),
    }
}

pub fn issue_token(user: &User) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user).expect("Failed to sign token")
}

pub async fn get_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send(TestRequest::get().uri(path), auth_header, configure).await
}

pub async fn post_request<T: Serialize>(
    auth_header: &str,
    path: &str,
    body: &T,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send(TestRequest::post().uri(path).set_json(body), auth_header, configure).await
}

pub async fn patch_request<T: Serialize>(
    auth_header: &str,
    path: &str,
    body: &T,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send(TestRequest::patch().uri(path).set_json(body), auth_header, configure).await
}

async fn send(
    mut req: TestRequest,
    auth_header: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    if !auth_header.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {auth_header}")));
    }
    let issuer = TokenIssuer::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(issuer)).configure(configure);

    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
