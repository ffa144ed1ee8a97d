use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Provider tag for accounts created with a password.
pub const PROVIDER_LOCAL: &str = "local";
/// Provider tag for accounts created or linked through Google sign-in.
pub const PROVIDER_GOOGLE: &str = "google";

/// A registered account as stored in the `users` table.
///
/// `password_hash` is NULL for Google-only accounts; `email` is nullable for
/// legacy rows. The verification token and reset OTP are single-use secrets,
/// each paired with an absolute expiry, and are cleared the moment they are
/// consumed.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub email_verified: bool,
    pub provider: String,
    pub google_id: Option<String>,
    pub avatar_url: Option<String>,
    pub verification_token: Option<String>,
    pub verification_token_expires: Option<DateTime<Utc>>,
    pub reset_otp: Option<String>,
    pub reset_otp_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public-safe view of an account returned by the API.
/// Never carries the password hash or any pending secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub provider: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            email_verified: user.email_verified,
            provider: user.provider.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl User {
    pub fn to_response(&self) -> UserResponse {
        UserResponse::from(self)
    }
}
