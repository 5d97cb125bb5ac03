/// Error response post-processing
///
/// [`ApiError`](crate::error::ApiError) always renders a `stack`. In
/// production this layer rewrites every error response so `stack` is
/// `null`, leaving status and message untouched. Responses that didn't come
/// from an `ApiError` pass through as-is.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    app::AppState,
    error::{ErrorReport, ErrorResponse},
};

pub async fn hide_error_stack(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    if state.config.api.environment.expose_error_stack() {
        return response;
    }

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let body = ErrorResponse {
        message: report.message,
        stack: None,
    };
    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            response.headers_mut().remove(header::CONTENT_LENGTH);
            *response.body_mut() = Body::from(bytes);
        }
        Err(e) => tracing::error!(error = %e, "Failed to re-encode error response"),
    }

    response
}
