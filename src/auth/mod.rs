pub mod extractors;
pub mod google;
pub mod middleware;
pub mod otp;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

use lazy_static::lazy_static;
use serde::Deserialize;
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use service::{AuthService, GoogleLogin};
pub use token::{issue_token, parse_token, Claims};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Payload for a new account registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username: 3-32 characters, alphanumeric plus `_` and `-`.
    #[validate(
        length(min = 3, max = 32, message = "Username minimal 3 karakter"),
        regex(
            path = "USERNAME_REGEX",
            message = "Username hanya boleh berisi huruf, angka, underscore, atau strip"
        )
    )]
    pub username: String,
    #[validate(email(message = "Format email tidak valid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password minimal 6 karakter"))]
    pub password: String,
}

/// Payload for login. The `username` field accepts either a username or an
/// email address.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Format email tidak valid"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "Format email tidak valid"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Format email tidak valid"))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP harus 6 digit"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Format email tidak valid"))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP harus 6 digit"))]
    pub otp: String,
    #[serde(rename = "newPassword")]
    #[validate(length(min = 6, message = "Password baru minimal 6 karakter"))]
    pub new_password: String,
}

/// Query string of the verification link embedded in the email.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

/// Query string Google appends to the callback redirect.
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Body of the mobile sign-in endpoint: an access token the app already
/// obtained from Google's SDK.
#[derive(Debug, Deserialize)]
pub struct GoogleMobileRequest {
    pub access_token: Option<String>,
}
