/// User account endpoints
///
/// - `POST /api/users` - Register, sets the session cookie
/// - `POST /api/users/auth` - Log in, sets the session cookie
/// - `POST /api/users/logout` - Clears the session cookie
/// - `GET /api/users/profile` - Current user (protected)
/// - `PUT /api/users/profile` - Update name, email or password (protected)
///
/// Bodies that aren't valid JSON get the usual `{message, stack}` 400.
///
/// Every success response carries the same public view of the user:
///
/// ```json
/// { "id": "uuid", "name": "A", "email": "a@x.com" }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use authstack_shared::{
    auth::{
        cookie::{cleared_session_cookie, session_cookie},
        jwt::issue_session_token,
        middleware::CurrentUser,
        password::{hash_password, verify_credentials, HashedPassword},
    },
    models::user::{CreateUser, PublicUser, UpdateUser, User},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register request
///
/// Missing fields deserialize as empty strings and fail validation with a
/// 400 rather than a body rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile update request; blank fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,
}

impl UpdateProfileRequest {
    fn without_blanks(self) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            name: present(self.name),
            email: present(self.email),
            password: present(self.password),
        }
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&PublicUser> for UserResponse {
    fn from(user: &PublicUser) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Logout response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn hash_in_background(password: String) -> ApiResult<HashedPassword> {
    Ok(tokio::task::spawn_blocking(move || hash_password(&password)).await??)
}

fn start_session(state: &AppState, jar: CookieJar, user_id: Uuid) -> ApiResult<CookieJar> {
    let token = issue_session_token(user_id, state.jwt_secret())?;
    Ok(jar.add(session_cookie(token, state.secure_cookies())))
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, or the email is already registered
/// - `500 Internal Server Error`: hashing or store failure
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<(StatusCode, CookieJar, Json<UserResponse>)> {
    req.validate()?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash = hash_in_background(req.password).await?;

    let user = state
        .users
        .create(CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let jar = start_session(&state, jar, user.id)?;
    Ok((StatusCode::CREATED, jar, Json(user.into())))
}

/// Log in with email and password
///
/// Unknown emails and wrong passwords get the same 401.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<(StatusCode, CookieJar, Json<UserResponse>)> {
    req.validate()?;

    let user = state.users.find_by_email(&req.email).await?;

    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let password = req.password;
    let valid = tokio::task::spawn_blocking(move || {
        verify_credentials(&password, stored_hash.as_ref())
    })
    .await??;

    let user = match user {
        Some(user) if valid => user,
        _ => {
            tracing::debug!("Login rejected");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    tracing::info!(user_id = %user.id, "User logged in");

    let jar = start_session(&state, jar, user.id)?;
    Ok((StatusCode::CREATED, jar, Json(user.into())))
}

/// Log out by expiring the session cookie
///
/// Public: logging out without a session is not an error.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(cleared_session_cookie(state.secure_cookies()));

    (
        jar,
        Json(MessageResponse {
            message: "User logged out".to_string(),
        }),
    )
}

/// Current user's profile
pub async fn get_profile(Extension(user): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&user.0))
}

/// Update the current user's profile
///
/// A new password is hashed before it reaches the store.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, or the new email is taken
/// - `404 Not Found`: the user was deleted after the session was verified
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> ApiResult<Json<UserResponse>> {
    let req = req.without_blanks();
    req.validate()?;

    let password_hash = match req.password {
        Some(password) => Some(hash_in_background(password).await?),
        None => None,
    };

    let updated = state
        .users
        .update(
            user.id,
            UpdateUser {
                name: req.name,
                email: req.email,
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %updated.id, "Profile updated");

    Ok(Json(updated.into()))
}
