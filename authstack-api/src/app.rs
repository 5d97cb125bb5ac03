/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use authstack_api::{app::{build_router, AppState}, config::Config};
/// use authstack_shared::store::memory::MemoryUserStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryUserStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{auth::protect, error::hide_error_stack},
    routes,
};
use authstack_shared::store::UserStore;
use axum::{
    http::{header, HeaderValue, Method, Uri},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// User persistence
    pub users: Arc<dyn UserStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, config: Config) -> Self {
        Self {
            users,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Whether session cookies get the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.config.api.environment.secure_cookies()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /                       # readiness text (public)
/// ├── GET  /health                 # health check (public)
/// └── /api/users/
///     ├── POST /                   # register
///     ├── POST /auth               # login
///     ├── POST /logout             # clear session cookie
///     ├── GET  /profile            # (protect)
///     └── PUT  /profile            # (protect)
/// ```
///
/// Anything else falls through to a 404 `"Not Found: <path>"`, including a
/// known path called with a method it doesn't serve.
///
/// # Middleware Stack
///
/// Outermost first: error stack redaction, CORS, request tracing, and
/// `protect` on the profile routes.
pub fn build_router(state: AppState) -> Router {
    let profile_routes = Router::new()
        .route(
            "/profile",
            get(routes::users::get_profile)
                .put(routes::users::update_profile)
                .fallback(not_found),
        )
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), protect));

    let user_routes = Router::new()
        .route("/", post(routes::users::register).fallback(not_found))
        .route("/auth", post(routes::users::login).fallback(not_found))
        .route("/logout", post(routes::users::logout).fallback(not_found))
        .merge(profile_routes);

    Router::new()
        .route("/", get(routes::health::ready).fallback(not_found))
        .route("/health", get(routes::health::health_check).fallback(not_found))
        .nest("/api/users", user_routes)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            hide_error_stack,
        ))
        .with_state(state)
}

/// Configures CORS from the allowed origins
///
/// `*` is permissive, for development. Otherwise only the listed origins
/// may call the API, with credentials so the session cookie is sent.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Not Found: {}", uri))
}
