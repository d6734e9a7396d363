use serde::Deserialize;

use crate::core::config::GoogleOAuthConfig;
use crate::core::error::{AppError, Result};

/// Userinfo surfaced by Google after a successful code exchange
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the Google OAuth 2.0 authorization-code flow
pub struct GoogleAuthClient {
    config: GoogleOAuthConfig,
    http_client: reqwest::Client,
}

impl GoogleAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Build the consent-screen URL the user is redirected to
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode("openid profile email"),
            urlencoding::encode(state),
        )
    }

    /// Exchange the authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        tracing::debug!("Exchanging Google authorization code");

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach Google token endpoint: {}", e);
                AppError::ExternalServiceError(format!("Failed to exchange code: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Google token endpoint error: HTTP {} - {}", status, body);
            return Err(AppError::Unauthorized(
                "Google sign-in could not be completed".to_string(),
            ));
        }

        let token = response.json::<TokenResponse>().await.map_err(|e| {
            tracing::error!("Failed to parse Google token response: {}", e);
            AppError::ExternalServiceError(format!("Failed to parse token response: {}", e))
        })?;

        Ok(token.access_token)
    }

    /// Fetch the signed-in user's profile
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo> {
        let response = self
            .http_client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach Google userinfo endpoint: {}", e);
                AppError::ExternalServiceError(format!("Failed to fetch userinfo: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Google userinfo endpoint error: HTTP {} - {}", status, body);
            return Err(AppError::ExternalServiceError(format!(
                "Google userinfo error: HTTP {}",
                status
            )));
        }

        response.json::<GoogleUserInfo>().await.map_err(|e| {
            tracing::error!("Failed to parse Google userinfo response: {}", e);
            AppError::ExternalServiceError(format!("Failed to parse userinfo response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: "client-id".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "http://localhost:3000/api/auth/google/callback".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }

    #[test]
    fn authorize_url_carries_encoded_parameters() {
        let client = GoogleAuthClient::new(config());
        let url = client.authorize_url("state-123");

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("scope=openid%20profile%20email"));
        assert!(url.contains("state=state-123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fgoogle%2Fcallback"
        ));
    }
}
