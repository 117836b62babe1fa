//! The authenticated request client.
//!
//! Every console REST call goes through [`ApiClient::execute`]: the current
//! bearer credential is attached, and a 401 on a not-yet-retried request is
//! recovered from by refreshing the access token and re-issuing the request
//! exactly once. Concurrent recoveries are coalesced into a single token
//! exchange by the [`RefreshCoordinator`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use atrium_application::{CredentialStore, RefreshCoordinator, RefreshOutcome, RefreshTicket};
use atrium_domain::{ApiRequest, ApiResponse, AuthError, ClientConfig, Credential, HttpMethod};

use super::ApiError;

const USER_AGENT: &str = concat!("Atrium/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// REST client for the console backend.
pub struct ApiClient {
    /// Client for authenticated traffic.
    http: Client,
    /// Separate client for the token renewal call; carries no default
    /// state so the expiring access credential can never leak onto it.
    refresh_http: Client,
    base_url: Url,
    timeout: Duration,
    credentials: Arc<dyn CredentialStore>,
    refresh: RefreshCoordinator,
    /// Current Authorization header value, re-read on every request and
    /// overwritten by sign-in, refresh, and purge.
    bearer: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the underlying HTTP
    /// clients cannot be constructed.
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&config.api_base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{e}: {}", config.api_base_url)))?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let refresh_http = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            refresh_http,
            base_url,
            timeout: config.request_timeout(),
            credentials,
            refresh: RefreshCoordinator::new(),
            bearer: RwLock::new(None),
        })
    }

    /// Execute a request against the backend.
    ///
    /// A 401 on the first attempt routes through the refresh coordinator
    /// and the request is re-issued once with the renewed credential. A
    /// 401 on the retry, or any other non-success status, is returned as
    /// [`ApiError::Status`]; transport errors propagate directly without
    /// touching the refresh path.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let bearer = self.current_bearer().await;
        let response = self.send(request, bearer).await?;
        if response.status != 401 {
            return Self::into_result(response);
        }

        debug!(path = %request.path, "authentication expired, recovering");
        let access_token = self.recover().await?;
        let retried = self
            .send(request, Some(format!("Bearer {access_token}")))
            .await?;
        // Already retried once; a second 401 propagates as a final error.
        Self::into_result(retried)
    }

    /// The currently stored access token, if any.
    ///
    /// Stream transports use this to authenticate at connect time.
    pub async fn access_token(&self) -> Option<String> {
        self.credentials.load().await.map(|c| c.access_token)
    }

    /// Drive one recovery: the first caller performs the token exchange,
    /// everyone else waits for its outcome.
    async fn recover(&self) -> Result<String, AuthError> {
        match self.refresh.begin() {
            RefreshTicket::Waiter(waiter) => waiter.outcome().await,
            RefreshTicket::Leader => {
                let outcome = self.exchange_refresh_token().await;
                match &outcome {
                    Ok(access_token) => {
                        *self.bearer.write().await = Some(format!("Bearer {access_token}"));
                        if let Err(e) = self.credentials.store_access_token(access_token).await {
                            warn!(error = %e, "failed to persist refreshed access token");
                        }
                    }
                    Err(error) => {
                        debug!(error = %error, "token refresh failed, purging credentials");
                        *self.bearer.write().await = None;
                        if let Err(e) = self.credentials.clear().await {
                            warn!(error = %e, "failed to purge credentials");
                        }
                    }
                }
                self.refresh.settle(outcome.clone());
                outcome
            }
        }
    }

    /// Perform the token renewal call on the bare client, authenticated
    /// with the refresh token alone.
    async fn exchange_refresh_token(&self) -> RefreshOutcome {
        let credential = self
            .credentials
            .load()
            .await
            .ok_or(AuthError::MissingRefreshToken)?;

        let url = self
            .endpoint("/auth/refresh-token")
            .map_err(|e| AuthError::Network {
                message: e.to_string(),
            })?;
        let response = self
            .refresh_http
            .get(url)
            .header(AUTHORIZATION, credential.refresh_bearer_header())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AuthError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed {
                status: Some(status.as_u16()),
                message: if body.is_empty() {
                    "refresh token rejected".to_string()
                } else {
                    body
                },
            });
        }

        let parsed: RefreshResponse = response.json().await.map_err(|e| AuthError::Network {
            message: format!("failed to parse refresh response: {e}"),
        })?;
        Ok(parsed.access_token)
    }

    /// Current Authorization header value, seeded lazily from the store.
    async fn current_bearer(&self) -> Option<String> {
        if let Some(header) = self.bearer.read().await.clone() {
            return Some(header);
        }

        let credential = self.credentials.load().await?;
        let header = credential.bearer_header();
        *self.bearer.write().await = Some(header.clone());
        Some(header)
    }

    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<String>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(&request.path)?;

        let mut builder = self
            .http
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(self.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(header) = bearer {
            builder = builder.header(AUTHORIZATION, header);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read body: {e}")))?
            .to_vec();

        Ok(ApiResponse::new(status, headers, body))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{e}: {path}")))
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn into_result(response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::Status {
                status: response.status,
                body: response.text(),
            })
        }
    }

    /// Install a fresh credential pair: persist it and prime the header
    /// cache. Used by the sign-in flows.
    pub(super) async fn install_credential(
        &self,
        credential: &Credential,
    ) -> Result<(), ApiError> {
        *self.bearer.write().await = Some(credential.bearer_header());
        self.credentials.store(credential).await?;
        Ok(())
    }

    /// Drop the cached header and purge stored credentials.
    pub(super) async fn purge_credential(&self) {
        *self.bearer.write().await = None;
        if let Err(e) = self.credentials.clear().await {
            warn!(error = %e, "failed to purge credentials");
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
