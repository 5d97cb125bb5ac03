//! # authstack shared library
//!
//! Types and logic shared by the authstack API server and its tests.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, session tokens, the session cookie, session verification
//! - `models`: the `User` model and its SQL
//! - `store`: the `UserStore` trait with Postgres and in-memory implementations
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
