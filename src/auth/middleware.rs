use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::parse_token;
use crate::config::Config;
use crate::error::AppError;

/// Public endpoints that are reachable without a bearer token.
fn is_public(path: &str) -> bool {
    path == "/health"
        || path.starts_with("/api/auth/register")
        || path.starts_with("/api/auth/login")
        || path.starts_with("/api/auth/verify-email")
        || path.starts_with("/api/auth/resend-verification")
        || path.starts_with("/api/auth/forgot-password")
        || path.starts_with("/api/auth/verify-otp")
        || path.starts_with("/api/auth/reset-password")
        || path.starts_with("/api/auth/google")
}

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = auth_header else {
            let app_err = AppError::Unauthorized("Token tidak ditemukan".into());
            return Box::pin(async move { Err(app_err.into()) });
        };

        // The signing secret is injected through app data, never read from
        // the environment here.
        let Some(config) = req.app_data::<web::Data<Config>>() else {
            let app_err = AppError::Internal("Config is not registered in app data".into());
            return Box::pin(async move { Err(app_err.into()) });
        };

        match parse_token(token, &config.jwt_secret) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(app_err) => Box::pin(async move { Err(app_err.into()) }),
        }
    }
}
