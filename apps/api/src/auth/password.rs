// Password hashing utilities
// Uses bcrypt for secure password hashing

use bcrypt::{hash, verify};

/// Work factor used for every stored password.
pub const BCRYPT_COST: u32 = 10;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hashes a password using bcrypt
///
/// # Example
/// ```
/// use permuta_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("my_password").unwrap();
/// assert!(verify_password("my_password", &hash).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, String> {
    hash(password, BCRYPT_COST).map_err(|e| e.to_string())
}

/// Verifies a password against a bcrypt hash
///
/// # Returns
/// * `Ok(bool)` - True if password matches, false otherwise
/// * `Err(String)` - If the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    verify(password, hash).map_err(|e| e.to_string())
}

/// Rejects passwords shorter than [`MIN_PASSWORD_LENGTH`] characters.
pub fn check_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}
