//! Common test utilities for integration tests
//!
//! Every context gets its own in-memory user store, so tests run in
//! parallel without a database. Requests go through the full router with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use authstack_api::app::{build_router, AppState};
use authstack_api::config::{ApiConfig, Config, DatabaseConfig, Environment, JwtConfig, MEMORY_DATABASE_URL};
use authstack_shared::auth::cookie::SESSION_COOKIE;
use authstack_shared::store::memory::MemoryUserStore;
use authstack_shared::store::UserStore;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing the router and its store
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryUserStore>,
    pub config: Config,
}

/// A response with its body already collected
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Value,
    pub text: String,
}

impl TestResponse {
    /// Value of the session cookie set by this response, if any
    pub fn session_cookie(&self) -> Option<String> {
        self.set_cookies.iter().find_map(|raw| {
            let pair = raw.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE).then(|| value.trim().to_string())
        })
    }

    /// Full `Set-Cookie` line for the session cookie
    pub fn session_set_cookie(&self) -> Option<&str> {
        self.set_cookies
            .iter()
            .map(String::as_str)
            .find(|raw| raw.starts_with(&format!("{}=", SESSION_COOKIE)))
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

impl TestContext {
    /// Context running in the `test` environment
    pub fn new() -> Self {
        Self::with_environment(Environment::Test)
    }

    pub fn with_environment(environment: Environment) -> Self {
        let config = test_config(environment);
        let store = Arc::new(MemoryUserStore::new());
        let app = build_router(AppState::new(store.clone(), config.clone()));

        Self { app, store, config }
    }

    /// Sends a request, optionally with a JSON body and a session cookie
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        session: Option<&str>,
    ) -> TestResponse {
        send(&self.app, method, uri, body, session).await
    }

    /// Sends a raw body, with a content type only if given
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        body: &str,
        content_type: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        collect(self.app.clone().oneshot(request).await.unwrap()).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/api/users",
            Some(json!({ "name": name, "email": email, "password": password })),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/api/users/auth",
            Some(json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    pub async fn profile(&self, session: Option<&str>) -> TestResponse {
        self.send(Method::GET, "/api/users/profile", None, session).await
    }
}

/// Configuration used by every test router
pub fn test_config(environment: Environment) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: MEMORY_DATABASE_URL.to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
    }
}

/// Router over an arbitrary store, for failure scenarios
pub fn router_with_store(users: Arc<dyn UserStore>) -> axum::Router {
    build_router(AppState::new(users, test_config(Environment::Test)))
}

/// Sends a request to `app`, optionally with a JSON body and a session cookie
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    session: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    collect(app.clone().oneshot(request).await.unwrap()).await
}

/// Collects status, `Set-Cookie` headers and body
pub async fn collect(response: Response<Body>) -> TestResponse {
    let status = response.status();
    let set_cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&bytes).to_string();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        set_cookies,
        body,
        text,
    }
}
