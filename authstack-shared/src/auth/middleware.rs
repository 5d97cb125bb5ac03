/// Session verification for Axum
///
/// [`authenticate`] turns an optional session token into the user it
/// belongs to. The API's `protect` layer calls it for every protected route
/// and stores the result in the request extensions as [`CurrentUser`].
///
/// Per request:
///
/// ```text
/// Unauthenticated --(cookie?)--> VerifyToken --> Authorized | Rejected
/// ```
///
/// Rejections never say which check failed: a bad signature, an expired
/// token, a malformed id and a deleted user all produce
/// [`AuthError::InvalidToken`].
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use authstack_shared::auth::middleware::CurrentUser;
///
/// async fn handler(Extension(user): Extension<CurrentUser>) -> String {
///     format!("Hello, {}!", user.name)
/// }
/// ```

use std::ops::Deref;

use tracing::debug;

use super::jwt::validate_token;
use crate::models::user::PublicUser;
use crate::store::{StoreError, UserStore};

/// Message for requests without a session cookie
pub const TOKEN_NOT_FOUND: &str = "Not Authorized! Token not found.";

/// Message for every other rejected session
pub const INVALID_TOKEN: &str = "Not Authorized! Invalid token.";

/// The authenticated user, password hash excluded
///
/// Inserted into request extensions by the `protect` layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub PublicUser);

impl Deref for CurrentUser {
    type Target = PublicUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Error type for session verification
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No session cookie on the request
    #[error("{}", TOKEN_NOT_FOUND)]
    MissingToken,

    /// Token failed verification or names no user
    #[error("{}", INVALID_TOKEN)]
    InvalidToken,

    /// User store unavailable
    #[error("Store error: {0}")]
    Store(String),
}

/// Verifies a session token and loads its user
///
/// # Errors
///
/// - [`AuthError::MissingToken`] if `token` is `None`
/// - [`AuthError::InvalidToken`] if the signature or expiry check fails,
///   the embedded id is malformed, or no such user exists
/// - [`AuthError::Store`] if the store itself fails
pub async fn authenticate(
    store: &dyn UserStore,
    secret: &str,
    token: Option<&str>,
) -> Result<CurrentUser, AuthError> {
    let token = token.ok_or(AuthError::MissingToken)?;

    let claims = validate_token(token, secret).map_err(|e| {
        debug!(error = %e, "Rejected session token");
        AuthError::InvalidToken
    })?;

    let user = match store.find_by_id(&claims.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!(user_id = %claims.user_id, "Session names an unknown user");
            return Err(AuthError::InvalidToken);
        }
        Err(StoreError::MalformedId(id)) => {
            debug!(user_id = %id, "Session carries a malformed user id");
            return Err(AuthError::InvalidToken);
        }
        Err(e) => return Err(AuthError::Store(e.to_string())),
    };

    Ok(CurrentUser(user.into()))
}
