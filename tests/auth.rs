use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use dotenv::dotenv;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use flowly::auth::AuthMiddleware;
use flowly::config::Config;
use flowly::error::AppError;
use flowly::routes;

fn test_config() -> Config {
    dotenv().ok();
    Config {
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/flowly_test".to_string()),
        server_port: 8080,
        server_host: "127.0.0.1".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        resend_api_key: String::new(),
        smtp_from_email: "noreply@flowly.app".to_string(),
        app_base_url: "http://127.0.0.1:8080".to_string(),
        google_client_id: String::new(),
        google_client_secret: String::new(),
        google_redirect_uri: String::new(),
    }
}

// connect_lazy lets validation-only tests run without a live database.
fn test_pool(config: &Config) -> PgPool {
    PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("Failed to build test pool")
}

macro_rules! test_app {
    ($pool:expr, $config:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new($config.clone()))
                .app_data(web::JsonConfig::default().error_handler(|_err, _req| {
                    AppError::BadRequest(
                        "Invalid JSON format. Please check your request body.".to_string(),
                    )
                    .into()
                }))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(routes::health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                ),
        )
        .await
    };
}

async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

// Requires a provisioned database (DATABASE_URL + schema.sql applied).
#[ignore]
#[actix_rt::test]
async fn test_register_verify_login_flow() {
    let config = test_config();
    let pool = test_pool(&config);
    cleanup_user(&pool, "integration@example.com").await;

    let app = test_app!(pool, config);

    // Register a new user
    let register_payload = json!({
        "username": "integration_user",
        "email": "integration@example.com",
        "password": "Password123!"
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );
    let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email_verified"], false);
    assert_eq!(body["user"]["provider"], "local");

    // Registering the same user again conflicts
    let req_conflict = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp_conflict = test::call_service(&app, req_conflict).await;
    assert_eq!(resp_conflict.status(), actix_web::http::StatusCode::CONFLICT);

    // Login before verification is rejected
    let login_payload = json!({
        "username": "integration_user",
        "password": "Password123!"
    });
    let req_login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&login_payload)
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    let status_login = resp_login.status();
    let body_login: serde_json::Value = test::read_body_json(resp_login).await;
    assert_eq!(status_login, actix_web::http::StatusCode::UNAUTHORIZED);
    assert_eq!(body_login["message"], "Email belum diverifikasi");

    // Fetch the pending verification token straight from storage
    let (token,): (String,) = sqlx::query_as(
        "SELECT verification_token FROM users WHERE email = $1",
    )
    .bind("integration@example.com")
    .fetch_one(&pool)
    .await
    .expect("pending verification token");

    // A bogus token is rejected without revealing why
    let req_bad = test::TestRequest::get()
        .uri("/api/auth/verify-email?token=definitely-not-the-token")
        .to_request();
    let resp_bad = test::call_service(&app, req_bad).await;
    assert_eq!(resp_bad.status(), actix_web::http::StatusCode::BAD_REQUEST);

    // The emailed token verifies the account
    let req_verify = test::TestRequest::get()
        .uri(&format!("/api/auth/verify-email?token={}", token))
        .to_request();
    let resp_verify = test::call_service(&app, req_verify).await;
    assert_eq!(resp_verify.status(), actix_web::http::StatusCode::OK);
    let body_verify: serde_json::Value = test::read_body_json(resp_verify).await;
    assert_eq!(body_verify["user"]["email_verified"], true);

    // The token is single-use
    let req_reuse = test::TestRequest::get()
        .uri(&format!("/api/auth/verify-email?token={}", token))
        .to_request();
    let resp_reuse = test::call_service(&app, req_reuse).await;
    assert_eq!(resp_reuse.status(), actix_web::http::StatusCode::BAD_REQUEST);

    // Login now succeeds and returns a 3-segment bearer token
    let req_login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&login_payload)
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    assert_eq!(resp_login.status(), actix_web::http::StatusCode::OK);
    let body_login: serde_json::Value = test::read_body_json(resp_login).await;
    let access_token = body_login["access_token"].as_str().unwrap().to_string();
    assert_eq!(access_token.split('.').count(), 3);
    assert_eq!(body_login["user"]["email_verified"], true);

    // Logging in by email works too
    let req_login_email = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({
            "username": "integration@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp_login_email = test::call_service(&app, req_login_email).await;
    assert_eq!(resp_login_email.status(), actix_web::http::StatusCode::OK);

    // The bearer token opens the protected profile endpoint
    let req_profile = test::TestRequest::get()
        .uri("/api/auth/profile")
        .append_header(("Authorization", format!("Bearer {}", access_token)))
        .to_request();
    let resp_profile = test::call_service(&app, req_profile).await;
    assert_eq!(resp_profile.status(), actix_web::http::StatusCode::OK);
    let body_profile: serde_json::Value = test::read_body_json(resp_profile).await;
    assert_eq!(body_profile["user"]["username"], "integration_user");

    // Without a token the profile endpoint is closed
    let req_no_token = test::TestRequest::get()
        .uri("/api/auth/profile")
        .to_request();
    let resp_no_token = test::call_service(&app, req_no_token).await;
    assert_eq!(
        resp_no_token.status(),
        actix_web::http::StatusCode::UNAUTHORIZED
    );

    cleanup_user(&pool, "integration@example.com").await;
}

// Requires a provisioned database.
#[ignore]
#[actix_rt::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let config = test_config();
    let pool = test_pool(&config);
    cleanup_user(&pool, "forgot_test@example.com").await;

    let app = test_app!(pool, config);

    let register_payload = json!({
        "username": "forgot_test_user",
        "email": "forgot_test@example.com",
        "password": "Password123!"
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // Known and unknown emails produce byte-identical responses
    let req_known = test::TestRequest::post()
        .uri("/api/auth/forgot-password")
        .set_json(&json!({ "email": "forgot_test@example.com" }))
        .to_request();
    let resp_known = test::call_service(&app, req_known).await;
    let status_known = resp_known.status();
    let body_known = test::read_body(resp_known).await;

    let req_unknown = test::TestRequest::post()
        .uri("/api/auth/forgot-password")
        .set_json(&json!({ "email": "nobody_here@example.com" }))
        .to_request();
    let resp_unknown = test::call_service(&app, req_unknown).await;
    let status_unknown = resp_unknown.status();
    let body_unknown = test::read_body(resp_unknown).await;

    assert_eq!(status_known, actix_web::http::StatusCode::OK);
    assert_eq!(status_known, status_unknown);
    assert_eq!(body_known, body_unknown);

    cleanup_user(&pool, "forgot_test@example.com").await;
}

// Requires a provisioned database.
#[ignore]
#[actix_rt::test]
async fn test_otp_reset_flow_is_single_use() {
    let config = test_config();
    let pool = test_pool(&config);
    cleanup_user(&pool, "reset_test@example.com").await;

    let app = test_app!(pool, config);

    // Register and request a reset
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "reset_test_user",
            "email": "reset_test@example.com",
            "password": "Password123!"
        }))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/auth/forgot-password")
        .set_json(&json!({ "email": "reset_test@example.com" }))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let (otp,): (String,) = sqlx::query_as("SELECT reset_otp FROM users WHERE email = $1")
        .bind("reset_test@example.com")
        .fetch_one(&pool)
        .await
        .expect("pending reset OTP");

    // verify-otp is side-effect-free: checking twice stays valid
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/auth/verify-otp")
            .set_json(&json!({ "email": "reset_test@example.com", "otp": otp }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["valid"], true);
    }

    // A never-issued code reports invalid without touching state
    let req = test::TestRequest::post()
        .uri("/api/auth/verify-otp")
        .set_json(&json!({ "email": "reset_test@example.com", "otp": "000000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["valid"], false);

    // Redeem the OTP
    let req = test::TestRequest::post()
        .uri("/api/auth/reset-password")
        .set_json(&json!({
            "email": "reset_test@example.com",
            "otp": otp,
            "newPassword": "NewPassword456!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    // The same OTP cannot be redeemed twice
    let req = test::TestRequest::post()
        .uri("/api/auth/reset-password")
        .set_json(&json!({
            "email": "reset_test@example.com",
            "otp": otp,
            "newPassword": "AnotherPassword789!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

    // And it no longer verifies either
    let req = test::TestRequest::post()
        .uri("/api/auth/verify-otp")
        .set_json(&json!({ "email": "reset_test@example.com", "otp": otp }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["valid"], false);

    cleanup_user(&pool, "reset_test@example.com").await;
}

// Validation fires before any storage access, so these run without a
// database thanks to the lazy pool.
#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let config = test_config();
    let pool = test_pool(&config);
    let app = test_app!(pool, config);

    let test_cases = vec![
        // Deserialization errors (missing fields)
        (
            json!({ "email": "test@example.com", "password": "Password123!" }),
            "missing username",
        ),
        (
            json!({ "username": "testuser", "password": "Password123!" }),
            "missing email",
        ),
        (
            json!({ "username": "testuser", "email": "test@example.com" }),
            "missing password",
        ),
        // Schema validation errors
        (
            json!({ "username": "testuser", "email": "invalid-email", "password": "Password123!" }),
            "invalid email format",
        ),
        (
            json!({ "username": "u", "email": "test@example.com", "password": "Password123!" }),
            "username too short",
        ),
        (
            json!({ "username": "a".repeat(33), "email": "test@example.com", "password": "Password123!" }),
            "username too long",
        ),
        (
            json!({ "username": "user name!", "email": "test@example.com", "password": "Password123!" }),
            "username with invalid chars",
        ),
        (
            json!({ "username": "testuser", "email": "test@example.com", "password": "123" }),
            "password too short",
        ),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            actix_web::http::StatusCode::BAD_REQUEST,
            "Test case failed: {}. Got {}. Body: {:?}",
            description,
            status,
            String::from_utf8_lossy(&body_bytes)
        );
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["success"], false, "envelope for {}", description);
    }
}

#[actix_rt::test]
async fn test_validation_errors_are_itemized() {
    let config = test_config();
    let pool = test_pool(&config);
    let app = test_app!(pool, config);

    // Two invalid fields produce two itemized entries in one pass
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "ab",
            "email": "not-an-email",
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Validation failed");
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
}

#[actix_rt::test]
async fn test_otp_payload_validation() {
    let config = test_config();
    let pool = test_pool(&config);
    let app = test_app!(pool, config);

    // OTP must be exactly 6 digits
    let req = test::TestRequest::post()
        .uri("/api/auth/verify-otp")
        .set_json(&json!({ "email": "a@x.com", "otp": "123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/auth/reset-password")
        .set_json(&json!({ "email": "a@x.com", "otp": "123456", "newPassword": "123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_protected_routes_reject_bad_tokens() {
    let config = test_config();
    let pool = test_pool(&config);
    let app = test_app!(pool, config);

    // Missing token
    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    // Garbage token
    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .append_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    // Two-segment token
    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .append_header(("Authorization", "Bearer abc.def"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_google_endpoint_returns_consent_url() {
    let mut config = test_config();
    config.google_client_id = "client-123".to_string();
    config.google_redirect_uri = "http://127.0.0.1:8080/api/auth/google/callback".to_string();
    let pool = test_pool(&config);
    let app = test_app!(pool, config);

    let req = test::TestRequest::get().uri("/api/auth/google").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let auth_url = body["auth_url"].as_str().unwrap();
    assert!(auth_url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(auth_url.contains("client_id=client-123"));
}

#[actix_rt::test]
async fn test_google_callback_requires_code() {
    let config = test_config();
    let pool = test_pool(&config);
    let app = test_app!(pool, config);

    let req = test::TestRequest::get()
        .uri("/api/auth/google/callback")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Authorization code is required");

    // A provider-reported error short-circuits before any exchange
    let req = test::TestRequest::get()
        .uri("/api/auth/google/callback?error=access_denied")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
}
