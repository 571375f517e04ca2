//! Authenticated client for the point-of-sale REST API.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the
//! stored access token, retries rate-limited responses, and recovers from
//! an expired access token by refreshing it once and replaying the request.
//! Concurrent requests that hit an expired token share a single refresh; see
//! [`RefreshGate`](super::refresh::RefreshGate).

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::auth::{MemoryTokenStore, TokenService, TokenStore};
use crate::config::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};

use super::refresh::{Admission, RefreshGate, RefreshLease};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Description of a request that can be sent again after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter only when the value is non-empty.
    pub fn query_if_present(self, key: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self
        } else {
            self.query(key, value.trim())
        }
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether this request has already been replayed after a 401.
    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// A request parked until the in-flight refresh settles.
struct Pending {
    request: ApiRequest,
    reply: oneshot::Sender<Result<Response, ApiError>>,
}

struct Inner {
    http: Client,
    base_url: String,
    tokens: TokenService,
    gate: RefreshGate<Pending>,
    initial_backoff: Duration,
}

/// API client for the point-of-sale backend.
/// Clone is cheap: clones share the connection pool, token store and refresh state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
    initial_backoff: Duration,
    store: Option<Arc<dyn TokenStore>>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            store: None,
        }
    }
}

impl ApiClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-request timeout. Also bounds the refresh call, so queued
    /// requests never wait on a hung refresh forever.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn rate_limit_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let http = Client::builder().timeout(self.timeout).build()?;
        let base_url = self.base_url.trim_end_matches('/').to_string();
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let tokens = TokenService::new(store, http.clone(), &base_url);

        Ok(ApiClient {
            inner: Arc::new(Inner {
                http,
                base_url,
                tokens,
                gate: RefreshGate::new(),
                initial_backoff: self.initial_backoff,
            }),
        })
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Create a client with default settings and the given token store
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        Self::builder().base_url(base_url).token_store(store).build()
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Whether a token refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.inner.gate.is_refreshing()
    }

    /// Number of requests waiting on the in-flight refresh
    pub fn queued_requests(&self) -> usize {
        self.inner.gate.queued()
    }

    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Send a request and decode the JSON body.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.execute(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
        })
    }

    /// Send a request whose response body is not needed (e.g. DELETE → 204).
    pub async fn send_discarding(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(request).await?;
        Ok(())
    }

    /// Send a request, recovering once from an expired access token.
    ///
    /// Non-2xx responses other than the recoverable 401 are mapped through
    /// [`ApiError::from_status`] and returned unchanged.
    pub async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let generation = self.inner.gate.generation();
        let token = self.inner.tokens.get_access_token();
        let response = self.dispatch(&request, token.as_deref()).await?;
        self.intercept(request, response, generation).await
    }

    /// Response side of `execute`: pass everything through except the
    /// first 401 of a request, which goes to token recovery.
    async fn intercept(
        &self,
        request: ApiRequest,
        response: Response,
        generation: u64,
    ) -> Result<Response, ApiError> {
        if response.status() != StatusCode::UNAUTHORIZED || request.retried {
            return Self::check_response(response).await;
        }

        debug!(method = %request.method, path = %request.path, "Access token rejected");
        self.recover(request, generation).await
    }

    /// Wait for, or perform, the token refresh and replay `request` once.
    ///
    /// A caller queued behind a refresh that is abandoned before it settles
    /// goes back through admission, so one of the waiters leads a new refresh.
    async fn recover(&self, mut request: ApiRequest, generation: u64) -> Result<Response, ApiError> {
        request.retried = true;

        loop {
            let (reply, receiver) = oneshot::channel();
            let waiter = Pending {
                request: request.clone(),
                reply,
            };

            match self.inner.gate.admit(waiter, generation) {
                Admission::Queued => {
                    debug!("Token refresh in flight, request queued");
                    match receiver.await {
                        Ok(result) => return result,
                        Err(_) => debug!(path = %request.path, "Token refresh abandoned, requeueing"),
                    }
                }
                Admission::Stale(Pending { request, .. }) => {
                    debug!(path = %request.path, "Token was refreshed meanwhile, replaying");
                    return match self.inner.tokens.get_access_token() {
                        Some(token) => self.replay(&request, Some(&token)).await,
                        None => Err(ApiError::Unauthorized),
                    };
                }
                Admission::Lead(lease, Pending { request, .. }) => {
                    return self.refresh_and_replay(lease, request).await;
                }
            }
        }
    }

    async fn refresh_and_replay(
        &self,
        lease: RefreshLease<'_, Pending>,
        request: ApiRequest,
    ) -> Result<Response, ApiError> {
        info!("Access token expired, refreshing");
        let refreshed = self.inner.tokens.refresh_access_token().await;

        // Clear before settling so queued callers observe the empty store
        if refreshed.is_err() {
            if let Err(e) = self.inner.tokens.remove_tokens() {
                warn!(error = %e, "Failed to clear stored tokens");
            }
        }
        let queued = lease.settle();

        match refreshed {
            Ok(token) => {
                self.replay_queued(queued, token.clone());
                self.replay(&request, Some(&token)).await
            }
            Err(err) => {
                let reason = match err {
                    ApiError::RefreshFailed(reason) => reason,
                    other => other.to_string(),
                };
                warn!(reason = %reason, queued = queued.len(), "Token refresh failed, rejecting waiting requests");
                for Pending { reply, .. } in queued {
                    let _ = reply.send(Err(ApiError::RefreshFailed(reason.clone())));
                }
                Err(ApiError::RefreshFailed(reason))
            }
        }
    }

    /// Replay queued requests one at a time, oldest first, in the background.
    fn replay_queued(&self, queued: Vec<Pending>, token: String) {
        if queued.is_empty() {
            return;
        }
        let client = self.clone();
        tokio::spawn(async move {
            debug!(count = queued.len(), "Replaying queued requests");
            for Pending { request, reply } in queued {
                if reply.is_closed() {
                    debug!(path = %request.path, "Queued caller went away, skipping replay");
                    continue;
                }
                let result = client.replay(&request, Some(&token)).await;
                let _ = reply.send(result);
            }
        });
    }

    /// Send an already-retried request. A 401 here is final.
    async fn replay(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let response = self.dispatch(request, token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(method = %request.method, path = %request.path, "Request rejected again after token refresh");
            return Err(ApiError::Unauthorized);
        }
        Self::check_response(response).await
    }

    /// Attach the bearer credential, if there is one.
    fn decorate(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => builder,
        }
    }

    /// Put a request on the wire, backing off while the server rate-limits us.
    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let url = self.url(&request.path);
        let mut retries = 0;
        let mut backoff = self.inner.initial_backoff;

        loop {
            let mut builder = self.inner.http.request(request.method.clone(), &url);
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(ref body) = request.body {
                builder = builder.json(body);
            }
            let response = Self::decorate(builder, token).send().await?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::RateLimited);
            }
            warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
            tokio::time::sleep(backoff).await;
            backoff *= 2; // Exponential backoff
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}
