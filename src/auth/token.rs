use crate::error::AppError;
use crate::models::User;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session tokens are valid for 24 hours from issuance.
const TOKEN_TTL_HOURS: i64 = 24;

/// Claims carried inside a session token: the account identity plus the
/// issuance and expiry timestamps. Reconstructed from the presented token on
/// every request; never persisted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the account's unique identifier.
    pub sub: i32,
    pub username: String,
    pub email: Option<String>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Issues a signed session token for an account.
///
/// The token is the compact `header.payload.signature` format: base64 header
/// and payload, HMAC-SHA256 signature over `header.payload` with the
/// injected secret. Expires 24 hours after issuance.
pub fn issue_token(user: &User, secret: &str) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::hours(TOKEN_TTL_HOURS))
        .expect("valid timestamp");

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

/// Verifies a session token and decodes its claims.
///
/// Fails closed: a malformed token, a missing segment, a signature mismatch
/// and an expired token all collapse into the same generic 401 error, so the
/// response never reveals which check failed.
pub fn parse_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Token tidak valid".into()))
}
