//! Login, logout and current-user lookup.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{endpoints, ApiClient, ApiError};
use crate::models::Usuario;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// Login state for one backend, built on top of an [`ApiClient`].
#[derive(Clone)]
pub struct AuthSession {
    api: ApiClient,
}

impl AuthSession {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Emails are matched case-insensitively by the backend
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Obtain a token pair for the given credentials and store it.
    ///
    /// Sent without the refresh interceptor: a 401 here means bad
    /// credentials, not an expired token.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let email = Self::normalize_email(email);
        let response = self
            .api
            .http()
            .post(self.api.url(endpoints::LOGIN))
            .json(&LoginRequest {
                email: &email,
                password,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorDetail>(&body)
                .map(|e| e.detail)
                .unwrap_or_else(|_| ApiError::truncate_body(&body));
            warn!(status = %status, "Login rejected");
            return Err(ApiError::InvalidCredentials(reason));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let tokens: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))?;

        match (tokens.access, tokens.refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                self.api.tokens().save_tokens(&access, &refresh)?;
                info!("Logged in");
                Ok(())
            }
            _ => Err(ApiError::InvalidResponse(
                "login response is missing the access or refresh token".to_string(),
            )),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.tokens().get_access_token().is_some()
    }

    /// Fetch the logged-in user, or `None` when no token is stored.
    ///
    /// If the session cannot be recovered the stored tokens are cleared.
    pub async fn current_user(&self) -> Result<Option<Usuario>, ApiError> {
        if !self.is_authenticated() {
            debug!("No access token, skipping current user lookup");
            return Ok(None);
        }

        match self.api.fetch_current_user().await {
            Ok(user) => Ok(Some(user)),
            Err(err) if err.is_auth_failure() => {
                warn!(error = %err, "Session could not be recovered, logging out");
                self.api.tokens().remove_tokens()?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.api.tokens().remove_tokens()?;
        info!("Logged out");
        Ok(())
    }
}
