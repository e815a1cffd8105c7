// JWT session tokens
// Issued at login/registration, verified by the request extractors

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (user_id)
/// * `phone` - Phone number the session was opened with
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub phone: String,
    pub exp: usize,
}

/// Creates a signed session token for a user
///
/// # Arguments
/// * `user_id` - The user's ID to include in the token
/// * `phone` - The user's phone number
/// * `secret` - The secret key for signing
/// * `ttl` - How long the token stays valid from `issued_at`
///
/// # Token Properties
/// - Signed with HS256 algorithm
/// - Contains user_id in 'sub' claim
///
/// # Example
/// ```
/// use permuta_api::auth::jwt::{create_token, verify_token};
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = create_token(user_id, "+258841234567", "secret", Utc::now(), Duration::hours(8))
///     .expect("valid token");
/// assert_eq!(verify_token(&token, "secret", Utc::now()).unwrap().sub, user_id);
/// ```
pub fn create_token(
    user_id: Uuid,
    phone: &str,
    secret: &str,
    issued_at: DateTime<Utc>,
    ttl: Duration,
) -> Result<String, String> {
    let claims = Claims {
        sub: user_id,
        phone: phone.to_string(),
        exp: (issued_at + ttl).timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies and decodes a JWT token
///
/// The signature is checked by `jsonwebtoken`; `exp` is checked against
/// `now`, the same clock the token was issued with.
///
/// # Returns
/// * `Ok(Claims)` - The decoded claims if token is valid
/// * `Err(String)` - If token is invalid or expired at `now`
pub fn verify_token(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Claims, String> {
    let mut validation = Validation::default();
    validation.validate_exp = false;

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &validation)
        .map(|data| data.claims)
        .map_err(|e| e.to_string())?;

    if (claims.exp as i64) <= now.timestamp() {
        return Err("ExpiredSignature".to_string());
    }
    Ok(claims)
}
