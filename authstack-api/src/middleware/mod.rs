/// Middleware modules for the API server
///
/// - `auth`: the `protect` gate for routes that need a signed-in user
/// - `error`: production redaction of error details

pub mod auth;
pub mod error;
