/// Database models
///
/// - `user`: User accounts and authentication

pub mod user;
