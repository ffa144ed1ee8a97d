//! Identity store adapter: every access to the `users` table lives here,
//! one parameterized statement per operation. Single-use and expiry
//! semantics are enforced in the statements themselves (expiry filters on
//! lookups, `google_id IS NULL` guard on linking), so concurrent requests
//! are resolved by the database rather than by in-process coordination.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{User, PROVIDER_GOOGLE, PROVIDER_LOCAL};

const USER_COLUMNS: &str = "id, username, email, password_hash, email_verified, provider, \
     google_id, avatar_url, verification_token, verification_token_expires, \
     reset_otp, reset_otp_expires, created_at, updated_at";

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = $1",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Login lookup: the identifier may be either a username or an email.
pub async fn find_by_username_or_email(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = $1 OR email = $1",
        USER_COLUMNS
    ))
    .bind(identifier)
    .fetch_optional(pool)
    .await
}

/// Resolves an account by verification token. The expiry filter lives in the
/// statement: an expired token is indistinguishable from an absent one.
pub async fn find_by_verification_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users \
         WHERE verification_token = $1 AND verification_token_expires > NOW()",
        USER_COLUMNS
    ))
    .bind(token)
    .fetch_optional(pool)
    .await
}

/// Resolves an account by email + reset OTP, expired codes filtered out.
pub async fn find_by_email_and_otp(
    pool: &PgPool,
    email: &str,
    otp: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users \
         WHERE email = $1 AND reset_otp = $2 AND reset_otp_expires > NOW()",
        USER_COLUMNS
    ))
    .bind(email)
    .bind(otp)
    .fetch_optional(pool)
    .await
}

/// Federated-login lookup: by Google subject id first, falling back to the
/// profile email for accounts registered locally.
pub async fn find_by_google_id_or_email(
    pool: &PgPool,
    google_id: &str,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE google_id = $1 OR email = $2",
        USER_COLUMNS
    ))
    .bind(google_id)
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Inserts a local account, unverified, with a pending verification token.
/// Uniqueness races fall through to the username/email constraints.
pub async fn insert_local(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    verification_token: &str,
    token_expires: DateTime<Utc>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users \
         (username, email, password_hash, email_verified, provider, \
          verification_token, verification_token_expires) \
         VALUES ($1, $2, $3, FALSE, $4, $5, $6) \
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(PROVIDER_LOCAL)
    .bind(verification_token)
    .bind(token_expires)
    .fetch_one(pool)
    .await
}

/// Inserts a Google account; federated accounts are verified at creation and
/// carry no password hash.
pub async fn insert_google(
    pool: &PgPool,
    username: &str,
    email: &str,
    google_id: &str,
    avatar_url: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users \
         (username, email, email_verified, provider, google_id, avatar_url) \
         VALUES ($1, $2, TRUE, $3, $4, $5) \
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(username)
    .bind(email)
    .bind(PROVIDER_GOOGLE)
    .bind(google_id)
    .bind(avatar_url)
    .fetch_one(pool)
    .await
}

/// Consumes a verification token: marks the account verified and clears the
/// token pair in the same statement.
pub async fn mark_email_verified(pool: &PgPool, id: i32) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users \
         SET email_verified = TRUE, verification_token = NULL, \
             verification_token_expires = NULL, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replaces the pending verification token (resend flow).
pub async fn set_verification_token(
    pool: &PgPool,
    id: i32,
    token: &str,
    expires: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users \
         SET verification_token = $2, verification_token_expires = $3, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(token)
    .bind(expires)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_reset_otp(
    pool: &PgPool,
    id: i32,
    otp: &str,
    expires: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users \
         SET reset_otp = $2, reset_otp_expires = $3, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(otp)
    .bind(expires)
    .execute(pool)
    .await?;
    Ok(())
}

/// Writes the new password and consumes the reset OTP in one statement, so
/// the code cannot be redeemed twice.
pub async fn update_password_and_clear_otp(
    pool: &PgPool,
    id: i32,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users \
         SET password_hash = $2, reset_otp = NULL, reset_otp_expires = NULL, \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(())
}

/// First-touch federated link on an existing account. The `google_id IS NULL`
/// guard makes the statement a no-op on every call after the first; returns
/// whether a row was written.
pub async fn link_google(
    pool: &PgPool,
    id: i32,
    google_id: &str,
    avatar_url: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users \
         SET google_id = $2, provider = $3, email_verified = TRUE, \
             avatar_url = COALESCE(avatar_url, $4), updated_at = NOW() \
         WHERE id = $1 AND google_id IS NULL",
    )
    .bind(id)
    .bind(google_id)
    .bind(PROVIDER_GOOGLE)
    .bind(avatar_url)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
