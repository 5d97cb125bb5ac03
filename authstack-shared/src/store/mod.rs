/// User persistence
///
/// [`UserStore`] is the seam between the HTTP layer and storage. Two
/// implementations ship:
///
/// - [`postgres::PgUserStore`]: production store over a `sqlx` pool
/// - [`memory::MemoryUserStore`]: in-process map for tests and local runs
///
/// # Example
///
/// ```
/// use authstack_shared::auth::password::hash_password;
/// use authstack_shared::models::user::CreateUser;
/// use authstack_shared::store::{memory::MemoryUserStore, UserStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryUserStore::new();
/// let user = store
///     .create(CreateUser {
///         name: "A".to_string(),
///         email: "a@x.com".to_string(),
///         password_hash: hash_password("secret")?,
///     })
///     .await?;
///
/// let found = store.find_by_id(&user.id.to_string()).await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::user::{CreateUser, UpdateUser, User};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another user already has this email
    #[error("Email already exists")]
    DuplicateEmail,

    /// An identifier that can't name any user
    #[error("Malformed user id: {0}")]
    MalformedId(String),

    /// Storage backend failure (connection, query, ...)
    #[error("Store error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateEmail
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Parses a raw user id
///
/// Ids arrive as strings from tokens and URLs. Anything that isn't a UUID
/// is [`StoreError::MalformedId`] rather than "not found".
pub fn parse_user_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|_| StoreError::MalformedId(raw.to_string()))
}

/// User persistence operations
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user, failing with [`StoreError::DuplicateEmail`] if the
    /// normalized email is taken
    async fn create(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Looks a user up by raw id
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Looks a user up by email (normalized before comparing)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Applies a partial update, returning `None` for unknown ids
    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError>;

    /// Checks the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}
