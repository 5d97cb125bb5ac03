/// End-to-end tests for the cookie session flow
///
/// Register, log in, read and update the profile, log out, and the ways a
/// session can be rejected.

mod common;

use authstack_api::config::Environment;
use authstack_shared::auth::jwt::{create_token, issue_session_token, Claims};
use authstack_shared::models::user::{CreateUser, UpdateUser, User};
use authstack_shared::store::{StoreError, UserStore};
use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{router_with_store, send, TestContext, TEST_SECRET};
use std::sync::Arc;
use serde_json::json;
use uuid::Uuid;

const INVALID_TOKEN: &str = "Not Authorized! Invalid token.";
const TOKEN_NOT_FOUND: &str = "Not Authorized! Token not found.";

#[tokio::test]
async fn test_register_login_profile() {
    let ctx = TestContext::new();

    let registered = ctx.register("A", "a@x.com", "secret").await;
    assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.text);
    assert_eq!(registered.body["name"], "A");
    assert_eq!(registered.body["email"], "a@x.com");
    assert!(registered.body["id"].is_string());
    assert!(registered.session_cookie().is_some());

    let login = ctx.login("a@x.com", "secret").await;
    assert_eq!(login.status, StatusCode::CREATED, "{}", login.text);
    assert_eq!(login.body["id"], registered.body["id"]);

    let token = login.session_cookie().unwrap();
    let profile = ctx.profile(Some(&token)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["id"], registered.body["id"]);
    assert_eq!(profile.body["name"], "A");
    assert_eq!(profile.body["email"], "a@x.com");

    let fields = profile.body.as_object().unwrap();
    assert!(fields.keys().all(|k| !k.to_lowercase().contains("password")));
    assert!(!profile.text.contains("argon2"));
}

#[tokio::test]
async fn test_register_sets_session_cookie_attributes() {
    let ctx = TestContext::new();

    let response = ctx.register("A", "a@x.com", "secret").await;
    let cookie = response.session_set_cookie().unwrap();

    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(cookie.contains("Secure"));
}

#[tokio::test]
async fn test_development_cookie_is_not_secure() {
    let ctx = TestContext::with_environment(Environment::Development);

    let response = ctx.register("A", "a@x.com", "secret").await;
    let cookie = response.session_set_cookie().unwrap();

    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_register_token_grants_access() {
    let ctx = TestContext::new();

    let registered = ctx.register("A", "a@x.com", "secret").await;
    let token = registered.session_cookie().unwrap();

    let profile = ctx.profile(Some(&token)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["email"], "a@x.com");
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let ctx = TestContext::new();

    ctx.register("A", "a@x.com", "secret").await;
    let again = ctx.register("B", "A@X.com", "other").await;

    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.message(), "User already exists");
    assert!(again.session_cookie().is_none());
    assert_eq!(ctx.store.len().await, 1);
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            Method::POST,
            "/api/users",
            Some(json!({ "name": "A", "email": "not-an-email" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("Invalid email format"));
    assert!(response.message().contains("Password is required"));
    assert!(ctx.store.is_empty().await);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let ctx = TestContext::new();
    ctx.register("A", "a@x.com", "secret").await;

    let response = ctx.login("a@x.com", "wrong").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), "Invalid email or password");
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let ctx = TestContext::new();
    ctx.register("A", "a@x.com", "secret").await;

    let unknown = ctx.login("nobody@x.com", "secret").await;
    let wrong = ctx.login("a@x.com", "wrong").await;

    assert_eq!(unknown.status, wrong.status);
    assert_eq!(unknown.message(), wrong.message());
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let ctx = TestContext::new();
    ctx.register("A", "A@X.com", "secret").await;

    let response = ctx.login("a@x.COM", "secret").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], "a@x.com");
}

#[tokio::test]
async fn test_two_logins_issue_distinct_working_tokens() {
    let ctx = TestContext::new();
    ctx.register("A", "a@x.com", "secret").await;

    let first = ctx.login("a@x.com", "secret").await.session_cookie().unwrap();
    let second = ctx.login("a@x.com", "secret").await.session_cookie().unwrap();

    assert_ne!(first, second);
    assert_eq!(ctx.profile(Some(&first)).await.status, StatusCode::OK);
    assert_eq!(ctx.profile(Some(&second)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_without_cookie() {
    let ctx = TestContext::new();

    let response = ctx.profile(None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), TOKEN_NOT_FOUND);
}

#[tokio::test]
async fn test_profile_with_empty_cookie() {
    let ctx = TestContext::new();

    let response = ctx.profile(Some("")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), TOKEN_NOT_FOUND);
}

#[tokio::test]
async fn test_profile_rejections_are_indistinguishable() {
    let ctx = TestContext::new();
    let registered = ctx.register("A", "a@x.com", "secret").await;
    let user_id: Uuid = registered.body["id"].as_str().unwrap().parse().unwrap();

    let forged = create_token(&Claims::new(user_id), "another-secret-that-is-32-bytes-long!").unwrap();
    let expired = create_token(
        &Claims::with_expiration(user_id, Duration::seconds(-60)),
        TEST_SECRET,
    )
    .unwrap();
    let unknown_user = create_token(&Claims::new(Uuid::new_v4()), TEST_SECRET).unwrap();
    let mut malformed_claims = Claims::new(user_id);
    malformed_claims.user_id = "not-a-uuid".to_string();
    let malformed_id = create_token(&malformed_claims, TEST_SECRET).unwrap();

    for token in [
        "garbage".to_string(),
        forged,
        expired,
        unknown_user,
        malformed_id,
    ] {
        let response = ctx.profile(Some(&token)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "token {token}");
        assert_eq!(response.message(), INVALID_TOKEN);
    }
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let ctx = TestContext::new();
    let token = ctx
        .register("A", "a@x.com", "secret")
        .await
        .session_cookie()
        .unwrap();

    // Swap the payload for one naming another user, keep the signature
    let parts: Vec<&str> = token.split('.').collect();
    let other = create_token(&Claims::new(Uuid::new_v4()), TEST_SECRET).unwrap();
    let other_payload = other.split('.').nth(1).unwrap();
    let tampered = format!("{}.{}.{}", parts[0], other_payload, parts[2]);

    let response = ctx.profile(Some(&tampered)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), INVALID_TOKEN);
}

#[tokio::test]
async fn test_deleted_user_loses_access() {
    let ctx = TestContext::new();
    let registered = ctx.register("A", "a@x.com", "secret").await;
    let token = registered.session_cookie().unwrap();
    let user_id: Uuid = registered.body["id"].as_str().unwrap().parse().unwrap();

    assert!(ctx.store.remove(user_id).await);

    let response = ctx.profile(Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), INVALID_TOKEN);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let ctx = TestContext::new();

    let response = ctx.send(Method::POST, "/api/users/logout", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "User logged out");

    let cookie = response.session_set_cookie().unwrap();
    assert!(cookie.starts_with("jwt=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("1970"));
}

#[tokio::test]
async fn test_logout_then_cleared_cookie_is_rejected() {
    let ctx = TestContext::new();
    let token = ctx
        .register("A", "a@x.com", "secret")
        .await
        .session_cookie()
        .unwrap();

    let logout = ctx.send(Method::POST, "/api/users/logout", None, Some(&token)).await;
    let cleared = logout.session_cookie().unwrap();
    assert!(cleared.is_empty());

    let response = ctx.profile(Some(&cleared)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), TOKEN_NOT_FOUND);
}

#[tokio::test]
async fn test_update_profile_name_and_email() {
    let ctx = TestContext::new();
    let token = ctx
        .register("A", "a@x.com", "secret")
        .await
        .session_cookie()
        .unwrap();

    let response = ctx
        .send(
            Method::PUT,
            "/api/users/profile",
            Some(json!({ "name": "Alice", "email": "Alice@X.com" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.text);
    assert_eq!(response.body["name"], "Alice");
    assert_eq!(response.body["email"], "alice@x.com");

    let profile = ctx.profile(Some(&token)).await;
    assert_eq!(profile.body["name"], "Alice");
    assert_eq!(profile.body["email"], "alice@x.com");
}

#[tokio::test]
async fn test_update_profile_blank_fields_are_ignored() {
    let ctx = TestContext::new();
    let token = ctx
        .register("A", "a@x.com", "secret")
        .await
        .session_cookie()
        .unwrap();

    let response = ctx
        .send(
            Method::PUT,
            "/api/users/profile",
            Some(json!({ "name": "", "email": "", "password": "" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.text);
    assert_eq!(response.body["name"], "A");
    assert_eq!(response.body["email"], "a@x.com");
    assert_eq!(ctx.login("a@x.com", "secret").await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_update_profile_password() {
    let ctx = TestContext::new();
    let token = ctx
        .register("A", "a@x.com", "secret")
        .await
        .session_cookie()
        .unwrap();

    let response = ctx
        .send(
            Method::PUT,
            "/api/users/profile",
            Some(json!({ "password": "new-secret" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text);

    assert_eq!(ctx.login("a@x.com", "secret").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.login("a@x.com", "new-secret").await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_update_profile_to_taken_email() {
    let ctx = TestContext::new();
    ctx.register("B", "b@x.com", "secret").await;
    let token = ctx
        .register("A", "a@x.com", "secret")
        .await
        .session_cookie()
        .unwrap();

    let response = ctx
        .send(
            Method::PUT,
            "/api/users/profile",
            Some(json!({ "email": "b@x.com" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "User already exists");
}

#[tokio::test]
async fn test_update_profile_requires_session() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            Method::PUT,
            "/api/users/profile",
            Some(json!({ "name": "Mallory" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), TOKEN_NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route() {
    let ctx = TestContext::new();

    let response = ctx.send(Method::GET, "/api/nope", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "Not Found: /api/nope");
    assert!(response.body["stack"].is_string());
}

#[tokio::test]
async fn test_production_hides_stack() {
    let ctx = TestContext::with_environment(Environment::Production);

    let missing = ctx.profile(None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.message(), TOKEN_NOT_FOUND);
    assert!(missing.body["stack"].is_null());
    assert!(missing.body.as_object().unwrap().contains_key("stack"));

    let not_found = ctx.send(Method::GET, "/nope", None, None).await;
    assert_eq!(not_found.status, StatusCode::NOT_FOUND);
    assert_eq!(not_found.message(), "Not Found: /nope");
    assert!(not_found.body["stack"].is_null());
}

#[tokio::test]
async fn test_readiness_and_health() {
    let ctx = TestContext::new();

    let ready = ctx.send(Method::GET, "/", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.text, "Server is ready!");

    let health = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");
    assert_eq!(health.body["database"], "connected");
}

#[tokio::test]
async fn test_known_path_with_wrong_method() {
    let ctx = TestContext::new();

    for (method, uri) in [
        (Method::GET, "/api/users"),
        (Method::GET, "/api/users/auth"),
        (Method::DELETE, "/api/users/logout"),
        (Method::POST, "/health"),
    ] {
        let response = ctx.send(method, uri, None, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(response.message(), format!("Not Found: {uri}"));
        assert!(response.body["stack"].is_string());
    }
}

#[tokio::test]
async fn test_malformed_json_body() {
    let ctx = TestContext::new();

    let response = ctx
        .send_raw(Method::POST, "/api/users", "{not json", Some("application/json"))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("JSON"), "{}", response.text);
    assert!(response.body["stack"].is_string());
    assert!(ctx.store.is_empty().await);
}

#[tokio::test]
async fn test_missing_content_type() {
    let ctx = TestContext::new();

    let response = ctx
        .send_raw(
            Method::POST,
            "/api/users/auth",
            r#"{"email":"a@x.com","password":"secret"}"#,
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("Content-Type"), "{}", response.text);
    assert!(response.body.as_object().unwrap().contains_key("stack"));
}

/// Store whose backend never answers
struct UnreachableStore;

#[async_trait::async_trait]
impl UserStore for UnreachableStore {
    async fn create(&self, _data: CreateUser) -> Result<User, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn update(&self, _id: Uuid, _data: UpdateUser) -> Result<Option<User>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_store_outage_during_session_check() {
    let app = router_with_store(Arc::new(UnreachableStore));
    let token = issue_session_token(Uuid::new_v4(), TEST_SECRET).unwrap();

    let response = send(&app, Method::GET, "/api/users/profile", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(response.message(), INVALID_TOKEN);

    let health = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "degraded");
}
