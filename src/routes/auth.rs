use crate::{
    auth::{
        google::GoogleAuthService, AuthService, AuthenticatedUser, ForgotPasswordRequest,
        GoogleCallbackQuery, GoogleMobileRequest, LoginRequest, RegisterRequest,
        ResendVerificationRequest, ResetPasswordRequest, VerifyEmailQuery, VerifyOtpRequest,
    },
    config::Config,
    error::AppError,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

fn auth_service(pool: &web::Data<PgPool>, config: &web::Data<Config>) -> AuthService {
    AuthService::new(pool.get_ref().clone(), config.get_ref().clone())
}

fn google_service(config: &web::Data<Config>) -> GoogleAuthService {
    GoogleAuthService::new(
        &config.google_client_id,
        &config.google_client_secret,
        &config.google_redirect_uri,
    )
}

/// Register a new user
///
/// Creates an unverified account and emails a verification link.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = auth_service(&pool, &config)
        .register(&register_data)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User berhasil dibuat, silakan cek email Anda untuk verifikasi",
        "user": user
    })))
}

/// Login with username (or email) and password; returns a bearer token.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let (access_token, user) = auth_service(&pool, &config).login(&login_data).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login berhasil",
        "access_token": access_token,
        "user": user
    })))
}

/// Consumes the verification token from the emailed link.
#[get("/verify-email")]
pub async fn verify_email(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    query: web::Query<VerifyEmailQuery>,
) -> Result<impl Responder, AppError> {
    let user = auth_service(&pool, &config)
        .verify_email(&query.token)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Email berhasil diverifikasi",
        "user": user
    })))
}

/// Issues a fresh verification link. The response does not reveal whether
/// the email belongs to an account.
#[post("/resend-verification")]
pub async fn resend_verification(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    request: web::Json<ResendVerificationRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    auth_service(&pool, &config)
        .resend_verification(&request.email)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Jika email terdaftar dan belum diverifikasi, tautan verifikasi baru telah dikirim"
    })))
}

/// Starts a password reset. The response is identical whether or not the
/// email exists.
#[post("/forgot-password")]
pub async fn forgot_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    request: web::Json<ForgotPasswordRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    auth_service(&pool, &config)
        .forgot_password(&request.email)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Jika email terdaftar, kode OTP telah dikirim"
    })))
}

/// Checks an OTP without consuming it.
#[post("/verify-otp")]
pub async fn verify_otp(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    let valid = auth_service(&pool, &config)
        .verify_otp(&request.email, &request.otp)
        .await?;

    let message = if valid {
        "Kode OTP valid"
    } else {
        "Kode OTP tidak valid atau sudah kedaluwarsa"
    };
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "valid": valid,
        "message": message
    })))
}

/// Redeems an OTP and sets the new password.
#[post("/reset-password")]
pub async fn reset_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    auth_service(&pool, &config)
        .reset_password(&request.email, &request.otp, &request.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password berhasil direset"
    })))
}

/// Returns the Google consent URL for the web flow.
#[get("/google")]
pub async fn google(config: web::Data<Config>) -> Result<impl Responder, AppError> {
    let auth_url = google_service(&config).auth_url()?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "auth_url": auth_url,
        "message": "Redirect user to this URL for Google authentication"
    })))
}

/// Google redirect target: exchanges the code, fetches the profile, then
/// logs in or registers the account.
#[get("/google/callback")]
pub async fn google_callback(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    query: web::Query<GoogleCallbackQuery>,
) -> Result<impl Responder, AppError> {
    if query.error.is_some() {
        return Err(AppError::BadRequest(
            "Google authentication was cancelled or failed".into(),
        ));
    }
    let Some(code) = &query.code else {
        return Err(AppError::BadRequest("Authorization code is required".into()));
    };

    let google_client = google_service(&config);
    let tokens = google_client.exchange_code(code).await?;
    let user_info = google_client.fetch_user_info(&tokens.access_token).await?;

    let result = auth_service(&pool, &config).google_auth(&user_info).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": if result.is_new_user { "Account created successfully" } else { "Login successful" },
        "access_token": result.access_token,
        "user": result.user,
        "is_new_user": result.is_new_user
    })))
}

/// Mobile sign-in: the app supplies a Google access token directly.
#[post("/google/mobile")]
pub async fn google_mobile(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    request: web::Json<GoogleMobileRequest>,
) -> Result<impl Responder, AppError> {
    let Some(access_token) = &request.access_token else {
        return Err(AppError::BadRequest(
            "Google access token is required".into(),
        ));
    };

    let user_info = google_service(&config).fetch_user_info(access_token).await?;
    let result = auth_service(&pool, &config).google_auth(&user_info).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": if result.is_new_user { "Account created successfully" } else { "Login successful" },
        "access_token": result.access_token,
        "user": result.user,
        "is_new_user": result.is_new_user
    })))
}

/// Returns the authenticated account's public profile.
#[get("/profile")]
pub async fn profile(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = auth_service(&pool, &config)
        .get_user(auth.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("User tidak ditemukan".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile berhasil diambil",
        "user": user
    })))
}
