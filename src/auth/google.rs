//! Google OAuth client: consent-URL construction, authorization-code
//! exchange, and profile fetch.

use crate::error::AppError;
use serde::Deserialize;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Debug, Deserialize)]
pub struct GoogleTokens {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Profile returned by the Google userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    /// Google's stable subject identifier for the account.
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub verified_email: bool,
}

pub struct GoogleAuthService {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    client: reqwest::Client,
}

impl GoogleAuthService {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Builds the consent URL the client should redirect the user to.
    pub fn auth_url(&self) -> Result<String, AppError> {
        let url = reqwest::Url::parse_with_params(
            AUTH_ENDPOINT,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build Google auth URL: {}", e)))?;
        Ok(url.into())
    }

    /// Exchanges an authorization code for tokens. Google's error text is
    /// forwarded to the caller on rejection; this is the one upstream whose
    /// detail is not collapsed into a generic message.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokens, AppError> {
        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Failed to get access token: {}",
                detail
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, AppError> {
        let response = self
            .client
            .get(USERINFO_ENDPOINT)
            .query(&[("access_token", access_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Failed to get user info: {}",
                detail
            )));
        }

        Ok(response.json().await?)
    }
}
