//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the
//! application. It centralizes error management, providing a consistent way to
//! represent the error conditions that can occur, from database issues to
//! validation failures.
//!
//! `AppError` implements `actix_web::error::ResponseError` to convert
//! application errors into HTTP responses with the `{success, message, ...}`
//! JSON envelope every endpoint uses. `From` trait implementations for
//! `sqlx::Error`, `validator::ValidationErrors`, `bcrypt::BcryptError` and
//! `reqwest::Error` allow conversion with the `?` operator.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Input failed schema validation (HTTP 400); carries the itemized list.
    Validation(Vec<String>),
    /// Malformed or invalid request (HTTP 400).
    BadRequest(String),
    /// Authentication failure (HTTP 401). All credential, verification and
    /// token failures use deliberately generic messages so a caller cannot
    /// distinguish which check failed.
    Unauthorized(String),
    /// Requested resource absent (HTTP 404).
    NotFound(String),
    /// Username or email already in use (HTTP 409).
    Conflict(String),
    /// An upstream provider (OAuth) rejected the request (HTTP 500);
    /// the upstream text is forwarded.
    Upstream(String),
    /// Unexpected server-side error (HTTP 500). The detail is logged and
    /// never sent to the client.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join(", ")),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream Error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(errors) => HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": "Validation failed",
                "errors": errors
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": msg
            })),
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "success": false,
                "message": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "success": false,
                "message": msg
            })),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(json!({
                "success": false,
                "message": msg
            })),
            AppError::Upstream(msg) => HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": msg
            })),
            AppError::Internal(msg) => {
                // The detail stays in the server log.
                log::error!("internal error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "success": false,
                    "message": "Internal server error"
                }))
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound`. A unique-constraint violation maps to
/// `Conflict`: the storage constraint is the final authority on duplicate
/// usernames/emails, so a race past the orchestrator's pre-check still
/// surfaces as 409 rather than 500.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                let constraint = db_err.constraint().unwrap_or_default();
                if constraint.contains("username") {
                    AppError::Conflict("Username sudah digunakan".into())
                } else if constraint.contains("email") {
                    AppError::Conflict("Email sudah digunakan".into())
                } else {
                    AppError::Conflict("Data sudah digunakan".into())
                }
            }
            _ => AppError::Internal(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::Validation`,
/// flattening every field error into one itemized list.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut messages = Vec::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                match &error.message {
                    Some(message) => messages.push(message.to_string()),
                    None => messages.push(format!("{} tidak valid", field)),
                }
            }
        }
        messages.sort();
        AppError::Validation(messages)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(error.to_string())
    }
}

/// Transport-level failures talking to an upstream provider.
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> AppError {
        AppError::Upstream(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Token tidak valid".into());
        let response = error.error_response();
        assert_eq!(response.status(), 401);

        let error = AppError::BadRequest("Invalid input".into());
        let response = error.error_response();
        assert_eq!(response.status(), 400);

        let error = AppError::NotFound("Task tidak ditemukan".into());
        let response = error.error_response();
        assert_eq!(response.status(), 404);

        let error = AppError::Conflict("Username sudah digunakan".into());
        let response = error.error_response();
        assert_eq!(response.status(), 409);

        let error = AppError::Internal("boom".into());
        let response = error.error_response();
        assert_eq!(response.status(), 500);

        let error = AppError::Validation(vec!["Username minimal 3 karakter".into()]);
        let response = error.error_response();
        assert_eq!(response.status(), 400);
    }

    #[test]
    fn test_validation_errors_are_itemized() {
        use validator::Validate;

        #[derive(Validate)]
        struct Probe {
            #[validate(length(min = 3, message = "Username minimal 3 karakter"))]
            username: String,
            #[validate(email(message = "Format email tidak valid"))]
            email: String,
        }

        let probe = Probe {
            username: "ab".into(),
            email: "not-an-email".into(),
        };
        let error: AppError = probe.validate().unwrap_err().into();
        match error {
            AppError::Validation(messages) => {
                assert_eq!(messages.len(), 2);
                assert!(messages.contains(&"Username minimal 3 karakter".to_string()));
                assert!(messages.contains(&"Format email tidak valid".to_string()));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}
