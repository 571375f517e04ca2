//! Token service: the credential store plus the refresh call.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{endpoints, ApiError};

use super::{TokenPair, TokenStore};

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    /// Present only when the backend rotates refresh tokens
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    http: Client,
    refresh_url: String,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>, http: Client, base_url: &str) -> Self {
        Self {
            store,
            http,
            refresh_url: format!("{}{}", base_url.trim_end_matches('/'), endpoints::REFRESH),
        }
    }

    pub fn get_access_token(&self) -> Option<String> {
        self.store.access_token().filter(|t| !t.is_empty())
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.store.refresh_token().filter(|t| !t.is_empty())
    }

    /// The stored pair, if any
    pub fn session(&self) -> Option<TokenPair> {
        self.store.load()
    }

    pub fn save_tokens(&self, access: &str, refresh: &str) -> Result<(), ApiError> {
        self.store
            .save(&TokenPair::new(access, refresh))
            .map_err(ApiError::storage)
    }

    pub fn remove_tokens(&self) -> Result<(), ApiError> {
        self.store.clear().map_err(ApiError::storage)?;
        debug!("Stored tokens removed");
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token and persist it.
    ///
    /// Every failure, including transport errors, is reported as
    /// [`ApiError::RefreshFailed`] so it can be handed to all waiting callers.
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let refresh = self
            .get_refresh_token()
            .ok_or_else(|| ApiError::RefreshFailed("no refresh token stored".to_string()))?;

        let response = self
            .http
            .post(&self.refresh_url)
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await
            .map_err(|e| ApiError::RefreshFailed(format!("refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RefreshFailed(format!(
                "refresh endpoint returned {}: {}",
                status,
                ApiError::truncate_body(&body)
            )));
        }

        let parsed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ApiError::RefreshFailed(format!("invalid refresh response: {}", e)))?;

        let rotated = parsed.refresh.unwrap_or(refresh);
        self.store
            .save(&TokenPair::new(parsed.access.clone(), rotated))
            .map_err(|e| ApiError::RefreshFailed(format!("failed to persist refreshed token: {:#}", e)))?;

        info!("Access token refreshed");
        Ok(parsed.access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn service(store: Arc<dyn TokenStore>) -> TokenService {
        TokenService::new(store, Client::new(), "http://localhost:8000/")
    }

    #[test]
    fn test_refresh_url_joins_base() {
        let tokens = service(Arc::new(MemoryTokenStore::new()));
        assert_eq!(tokens.refresh_url, "http://localhost:8000/api/token/refresh/");
    }

    #[test]
    fn test_empty_tokens_read_as_missing() {
        let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("", "")));
        let tokens = service(store);
        assert!(tokens.get_access_token().is_none());
        assert!(tokens.get_refresh_token().is_none());
    }

    #[test]
    fn test_save_and_remove() {
        let tokens = service(Arc::new(MemoryTokenStore::new()));
        tokens.save_tokens("a", "r").unwrap();
        assert_eq!(tokens.get_access_token().as_deref(), Some("a"));
        assert_eq!(tokens.get_refresh_token().as_deref(), Some("r"));

        tokens.remove_tokens().unwrap();
        assert!(tokens.get_access_token().is_none());
        assert!(tokens.session().is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails_fast() {
        let tokens = service(Arc::new(MemoryTokenStore::new()));
        let err = tokens.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, ApiError::RefreshFailed(ref msg) if msg.contains("no refresh token")));
    }
}
