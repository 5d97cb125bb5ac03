/// API route handlers
///
/// - `health`: readiness and health check endpoints
/// - `users`: registration, login, logout and profile endpoints

pub mod health;
pub mod users;
