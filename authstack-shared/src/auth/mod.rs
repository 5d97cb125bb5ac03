/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: session token signing and validation
/// - [`cookie`]: the `jwt` session cookie
/// - [`middleware`]: resolving a session to the current user
///
/// # Example
///
/// ```
/// use authstack_shared::auth::password::{hash_password, verify_password};
/// use authstack_shared::auth::jwt::{issue_session_token, validate_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let user_id = Uuid::new_v4();
/// let token = issue_session_token(user_id, "secret-key")?;
/// assert_eq!(validate_token(&token, "secret-key")?.user_id, user_id.to_string());
/// # Ok(())
/// # }
/// ```

pub mod cookie;
pub mod jwt;
pub mod middleware;
pub mod password;
