/// Route protection
///
/// `protect` reads the `jwt` cookie, resolves it to a user through
/// [`authenticate`], and stores [`CurrentUser`] in the request extensions.
/// Rejected requests get a 401 and never reach the handler.
///
/// # Example
///
/// ```no_run
/// use authstack_api::{app::AppState, middleware::auth::protect};
/// use axum::{routing::get, Router};
///
/// fn routes(state: AppState) -> Router<AppState> {
///     Router::new()
///         .route("/profile", get(|| async { "secret" }))
///         .layer(axum::middleware::from_fn_with_state(state, protect))
/// }
/// ```

use authstack_shared::auth::{
    cookie::session_token,
    middleware::{authenticate, CurrentUser},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::ApiError};

pub async fn protect(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(req.headers());

    let user: CurrentUser =
        authenticate(state.users.as_ref(), state.jwt_secret(), token.as_deref()).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
