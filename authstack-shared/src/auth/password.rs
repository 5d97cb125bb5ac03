/// Password hashing module using Argon2id
///
/// Passwords are hashed with Argon2id and stored in PHC string format.
/// The only way to obtain a [`HashedPassword`] is to hash a plaintext or to
/// read one back from storage, so stores can never be handed plaintext.
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
/// - **Salt**: 16 random bytes per hash
///
/// # Example
///
/// ```
/// use authstack_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("secret")?;
///
/// assert!(verify_password("secret", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use std::{fmt, sync::OnceLock};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// A salted Argon2id hash in PHC string format
///
/// `Debug` is redacted so hashes do not end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wraps a hash previously produced by [`hash_password`] and read back from storage
    pub(crate) fn from_stored(phc: String) -> Self {
        Self(phc)
    }

    /// PHC string, for persisting
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(<redacted>)")
    }
}

/// Hashes a password using Argon2id with a fresh random salt
///
/// Example output:
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// This is CPU and memory heavy. From async code call it through
/// `tokio::task::spawn_blocking`.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<HashedPassword, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536) // 64 MB
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(HashedPassword(password_hash.to_string()))
}

/// Verifies a password against a stored hash
///
/// Comparison is constant-time. Parameters are read from the PHC string,
/// so hashes made with older parameters keep verifying.
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash can't be parsed,
/// `PasswordError::VerifyError` for any other failure.
pub fn verify_password(password: &str, hash: &HashedPassword) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash.as_str())
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    if parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHash("Hash has no output".to_string()));
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks a login attempt against an account's hash, if there is one
///
/// With no account, a throwaway hash is verified instead and the result
/// is always `false`, so an unknown email costs as much time as a wrong
/// password.
pub fn verify_credentials(
    password: &str,
    hash: Option<&HashedPassword>,
) -> Result<bool, PasswordError> {
    static DUMMY_HASH: OnceLock<Option<HashedPassword>> = OnceLock::new();

    match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.get_or_init(|| hash_password("dummy-password").ok()) {
                verify_password(password, dummy)?;
            }
            Ok(false)
        }
    }
}
