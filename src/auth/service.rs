//! Auth orchestrator: composes the credential hasher, token codec, secret
//! generator, identity store, email sender and Google client into the
//! user-facing flows. Holds no state of its own beyond the pool and config;
//! one instance is built per request, mirroring stateless invocation.

use chrono::Utc;
use sqlx::PgPool;

use crate::auth::google::GoogleUserInfo;
use crate::auth::{otp, password, store, token};
use crate::config::Config;
use crate::email::EmailService;
use crate::error::AppError;
use crate::models::{UserResponse, PROVIDER_LOCAL};

use super::{LoginRequest, RegisterRequest};

/// Outcome of a federated login: a session plus whether the account was
/// created by this call.
pub struct GoogleLogin {
    pub access_token: String,
    pub user: UserResponse,
    pub is_new_user: bool,
}

pub struct AuthService {
    db: PgPool,
    config: Config,
}

impl AuthService {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self { db, config }
    }

    fn mailer(&self) -> EmailService {
        EmailService::new(
            &self.config.resend_api_key,
            &self.config.smtp_from_email,
            &self.config.app_base_url,
        )
    }

    /// Registers a local account: unverified at birth, with a pending
    /// verification token emailed to the user. The email send is
    /// best-effort; its failure never aborts the registration.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserResponse, AppError> {
        if store::find_by_username(&self.db, &request.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username sudah digunakan".into()));
        }
        if store::find_by_email(&self.db, &request.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Email sudah digunakan".into()));
        }

        let password_hash = password::hash_password(&request.password)?;
        let verification_token = otp::generate_verification_token();
        let token_expires = otp::verification_token_expiry();

        // The uniqueness constraints remain the final authority; a race past
        // the pre-checks above still maps to 409 via the sqlx conversion.
        let user = store::insert_local(
            &self.db,
            &request.username,
            &request.email,
            &password_hash,
            &verification_token,
            token_expires,
        )
        .await?;

        if !self
            .mailer()
            .send_verification_email(&request.email, &request.username, &verification_token)
            .await
        {
            log::warn!(
                "verification email to {} could not be sent; user {} registered anyway",
                request.email,
                user.id
            );
        }

        Ok(user.to_response())
    }

    /// Authenticates by username or email. Absent account, wrong password and
    /// unverified email each fail with their own message, but credential
    /// failures stay generic so username and password mistakes are
    /// indistinguishable.
    pub async fn login(&self, request: &LoginRequest) -> Result<(String, UserResponse), AppError> {
        let user = store::find_by_username_or_email(&self.db, &request.username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Username atau password salah".into()))?;

        if !user.email_verified {
            return Err(AppError::Unauthorized("Email belum diverifikasi".into()));
        }
        if user.provider != PROVIDER_LOCAL {
            return Err(AppError::Unauthorized(
                "Akun ini terdaftar dengan Google, silakan login dengan Google".into(),
            ));
        }
        let Some(password_hash) = &user.password_hash else {
            return Err(AppError::Unauthorized("Username atau password salah".into()));
        };
        if !password::verify_password(&request.password, password_hash)? {
            return Err(AppError::Unauthorized("Username atau password salah".into()));
        }

        let access_token = token::issue_token(&user, &self.config.jwt_secret)?;
        Ok((access_token, user.to_response()))
    }

    /// Consumes a verification token. Expired and unknown tokens are
    /// indistinguishable; a valid one flips the account to verified and
    /// clears the token pair.
    pub async fn verify_email(&self, token: &str) -> Result<UserResponse, AppError> {
        let user = store::find_by_verification_token(&self.db, token)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Token verifikasi tidak valid atau sudah kedaluwarsa".into())
            })?;

        store::mark_email_verified(&self.db, user.id).await?;

        let user = store::find_by_id(&self.db, user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User tidak ditemukan".into()))?;
        Ok(user.to_response())
    }

    /// Issues a fresh verification token for an unverified local account.
    /// Always silent about whether the email exists.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AppError> {
        if let Some(user) = store::find_by_email(&self.db, email).await? {
            if !user.email_verified && user.provider == PROVIDER_LOCAL {
                let verification_token = otp::generate_verification_token();
                let expires = otp::verification_token_expiry();
                store::set_verification_token(&self.db, user.id, &verification_token, expires)
                    .await?;
                if !self
                    .mailer()
                    .send_verification_email(email, &user.username, &verification_token)
                    .await
                {
                    log::warn!("verification email resend to {} failed", email);
                }
            }
        }
        Ok(())
    }

    /// Starts a password reset. The response is identical whether or not the
    /// email exists, so the endpoint cannot be used to enumerate accounts.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        if let Some(user) = store::find_by_email(&self.db, email).await? {
            let reset_otp = otp::generate_otp();
            let expires = otp::reset_otp_expiry();
            store::set_reset_otp(&self.db, user.id, &reset_otp, expires).await?;
            if !self
                .mailer()
                .send_password_reset_otp(email, &user.username, &reset_otp)
                .await
            {
                log::warn!("reset OTP email to {} failed", email);
            }
        }
        Ok(())
    }

    /// Side-effect-free OTP check: reports validity without consuming the
    /// code or touching any account state.
    pub async fn verify_otp(&self, email: &str, otp_code: &str) -> Result<bool, AppError> {
        Ok(store::find_by_email_and_otp(&self.db, email, otp_code)
            .await?
            .is_some())
    }

    /// Re-checks the OTP, then writes the new password and clears the reset
    /// fields atomically; the code redeems exactly once.
    pub async fn reset_password(
        &self,
        email: &str,
        otp_code: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = store::find_by_email_and_otp(&self.db, email, otp_code)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Kode OTP tidak valid atau sudah kedaluwarsa".into())
            })?;

        let password_hash = password::hash_password(new_password)?;
        store::update_password_and_clear_otp(&self.db, user.id, &password_hash).await?;
        Ok(())
    }

    /// Federated login/registration from a Google profile.
    ///
    /// Unknown profile: creates a verified Google account under a username
    /// derived from the display name. Known account without a Google link:
    /// links it first-touch (the store guard keeps later calls from
    /// mutating anything). Either way a session token is issued.
    pub async fn google_auth(&self, profile: &GoogleUserInfo) -> Result<GoogleLogin, AppError> {
        let existing =
            store::find_by_google_id_or_email(&self.db, &profile.id, &profile.email).await?;

        let (user, is_new_user) = match existing {
            None => {
                let username = self.available_username(&profile.name).await?;
                let user = store::insert_google(
                    &self.db,
                    &username,
                    &profile.email,
                    &profile.id,
                    profile.picture.as_deref(),
                )
                .await?;
                (user, true)
            }
            Some(user) => {
                if user.google_id.is_none() {
                    store::link_google(&self.db, user.id, &profile.id, profile.picture.as_deref())
                        .await?;
                    let user = store::find_by_id(&self.db, user.id)
                        .await?
                        .ok_or_else(|| AppError::NotFound("User tidak ditemukan".into()))?;
                    (user, false)
                } else {
                    (user, false)
                }
            }
        };

        let access_token = token::issue_token(&user, &self.config.jwt_secret)?;
        Ok(GoogleLogin {
            access_token,
            user: user.to_response(),
            is_new_user,
        })
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<UserResponse>, AppError> {
        Ok(store::find_by_id(&self.db, id)
            .await?
            .map(|user| user.to_response()))
    }

    /// Derives a username from a display name and disambiguates with the
    /// current Unix timestamp when taken.
    async fn available_username(&self, display_name: &str) -> Result<String, AppError> {
        let mut candidate = derive_username(display_name);
        if store::find_by_username(&self.db, &candidate).await?.is_some() {
            candidate = format!("{}{}", candidate, Utc::now().timestamp());
        }
        Ok(candidate)
    }
}

/// Lowercases the display name and strips everything outside a-z0-9.
/// Falls back to "user" when nothing survives.
fn derive_username(display_name: &str) -> String {
    let candidate: String = display_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if candidate.is_empty() {
        "user".to_string()
    } else {
        candidate
    }
}
