//! Resilient API client.
//!
//! Single point of outgoing traffic. Every call goes through the same path:
//!
//! 1. resolve the URL against the configured base
//! 2. attach `Authorization: Bearer <token>` when a token is stored
//! 3. send through the [`HttpTransport`] port
//! 4. on 401, refresh and replay once if possible, otherwise tear the
//!    session down and redirect to the login path
//! 5. normalize any failure into an [`ApiError`]
//!
//! Network failures and 5xx responses are retried with exponential backoff
//! around steps 2-5. A request refreshes its token at most once, including
//! across those retries. No request timeout is applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lyceum_domain::auth::bearer_header;
use lyceum_domain::{ACCESS_TOKEN_KEY, ApiError, ApiRequest, Credentials, REFRESH_TOKEN_KEY};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::{AuthAttempt, RetryPolicy, SessionState};
use crate::config::{ClientConfig, ConfigError};
use crate::ports::{
    HttpTransport, Navigator, TokenRefresher, TokenStorage, TransportRequest, TransportResponse,
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP client for the platform's REST backend.
///
/// Construct one per application root and share it by `Arc`; services and
/// request handles receive it by reference.
pub struct ApiClient<C: HttpTransport> {
    transport: Arc<C>,
    storage: Arc<dyn TokenStorage>,
    navigator: Arc<dyn Navigator>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    config: ClientConfig,
    base_url: Url,
    retry: RetryPolicy,
    session: Mutex<SessionState>,
}

impl<C: HttpTransport> ApiClient<C> {
    /// Creates a client from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not validate.
    pub fn new(
        transport: Arc<C>,
        storage: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
        config: ClientConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;
        let retry = config.retry_policy();

        Ok(Self {
            transport,
            storage,
            navigator,
            refresher: None,
            config,
            base_url,
            retry,
            session: Mutex::new(SessionState::default()),
        })
    }

    /// Enables refresh-and-replay on the first 401 of a request.
    #[must_use]
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Overrides the retry policy derived from the configuration.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The active retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Current authentication state.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        *self.session.lock()
    }

    /// Sends `request` and decodes the JSON response into `R`.
    ///
    /// Empty bodies decode as JSON `null`, so `()` and `Option<_>` work for 204s.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the last attempt.
    pub async fn request<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let (status, body) = self.execute(&request).await?;
        serde_json::from_value(body).map_err(|e| ApiError::Decode {
            status,
            message: e.to_string(),
        })
    }

    /// Sends `request` and returns the raw JSON response.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the last attempt.
    pub async fn request_value(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.execute(&request).await.map(|(_, body)| body)
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.request(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<R, B>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.request(ApiRequest::post(path).with_json(body)?).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<R, B>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.request(ApiRequest::put(path).with_json(body)?).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch<R, B>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.request(ApiRequest::patch(path).with_json(body)?).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.request(ApiRequest::delete(path)).await
    }

    /// Stored credentials, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the store cannot be read.
    pub async fn credentials(&self) -> Result<Option<Credentials>, ApiError> {
        Ok(self.storage.load_credentials().await?)
    }

    /// Persists fresh credentials and marks the session live again.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the store cannot be written.
    pub async fn store_credentials(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.storage.store_credentials(credentials).await?;
        *self.session.lock() = SessionState::Authenticated;
        tracing::info!(token = %credentials.preview(), "credentials stored");
        Ok(())
    }

    /// Drops stored credentials without navigating anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the store cannot be written.
    pub async fn clear_credentials(&self) -> Result<(), ApiError> {
        *self.session.lock() = SessionState::Unauthenticated;
        self.storage.clear_credentials().await?;
        tracing::info!("credentials cleared");
        Ok(())
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(method = %request.method, path = %request.path)
    )]
    async fn execute(&self, request: &ApiRequest) -> Result<(u16, Value), ApiError> {
        let url = self.resolve_url(request)?;
        let refreshed = AtomicBool::new(false);
        self.retry
            .run(|attempt| {
                tracing::debug!(attempt = attempt + 1, url = %url, "sending request");
                self.send_authenticated(request, &url, &refreshed)
            })
            .await
    }

    async fn send_authenticated(
        &self,
        request: &ApiRequest,
        url: &Url,
        refreshed: &AtomicBool,
    ) -> Result<(u16, Value), ApiError> {
        let mut attempt = AuthAttempt::new(request);
        if refreshed.load(Ordering::SeqCst) {
            attempt = attempt.replayed();
        }
        loop {
            let token = self.storage.get(ACCESS_TOKEN_KEY).await?;
            let outgoing = Self::build_request(attempt.request, url, token.as_deref())?;
            let response = self
                .transport
                .send(outgoing)
                .await
                .map_err(|e| ApiError::network(e.to_string()))?;

            if response.status == 401 {
                if !attempt.auth_retried && self.refresh_session().await {
                    refreshed.store(true, Ordering::SeqCst);
                    attempt = attempt.replayed();
                    continue;
                }
                let error = ApiError::from_response(401, &response.body);
                self.force_logout().await;
                return Err(error);
            }

            if !response.is_success() {
                let error = ApiError::from_response(response.status, &response.body);
                tracing::debug!(status = response.status, error = %error, "request failed");
                return Err(error);
            }

            return Ok((response.status, decode_body(&response)));
        }
    }

    fn resolve_url(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let joined = if request.is_absolute() {
            request.path.clone()
        } else {
            format!(
                "{}/{}",
                self.base_url.as_str().trim_end_matches('/'),
                request.path.trim_start_matches('/')
            )
        };
        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::InvalidRequest(format!("{e}: {}", request.path)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    fn build_request(
        request: &ApiRequest,
        url: &Url,
        token: Option<&str>,
    ) -> Result<TransportRequest, ApiError> {
        let mut headers = vec![
            ("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()),
            ("Accept".to_string(), JSON_CONTENT_TYPE.to_string()),
        ];
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), bearer_header(token)));
        }
        headers.extend(request.headers.iter().cloned());

        let body = request
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(TransportRequest {
            method: request.method,
            url: url.to_string(),
            headers,
            body,
        })
    }

    async fn refresh_session(&self) -> bool {
        let Some(refresher) = &self.refresher else {
            return false;
        };
        let refresh_token = match self.storage.get(REFRESH_TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => return false,
            Err(error) => {
                tracing::warn!(error = %error, "could not read refresh token");
                return false;
            }
        };

        match refresher.refresh(&refresh_token).await {
            Ok(mut credentials) => {
                if credentials.refresh_token.is_none() {
                    credentials.refresh_token = Some(refresh_token);
                }
                match self.storage.store_credentials(&credentials).await {
                    Ok(()) => {
                        tracing::info!(token = %credentials.preview(), "session refreshed");
                        true
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "could not store refreshed credentials");
                        false
                    }
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "token refresh failed");
                false
            }
        }
    }

    async fn force_logout(&self) {
        if let Err(error) = self.storage.clear_credentials().await {
            tracing::warn!(error = %error, "could not clear credentials after 401");
        }

        let was_live = {
            let mut session = self.session.lock();
            std::mem::replace(&mut *session, SessionState::Unauthenticated).is_authenticated()
        };

        if was_live {
            tracing::warn!(login_path = %self.config.login_path, "session expired, redirecting");
            self.navigator.redirect(&self.config.login_path);
        } else {
            tracing::debug!("401 on an already closed session");
        }
    }
}

/// Empty bodies become `null`; non-JSON text is passed through as a string.
fn decode_body(response: &TransportResponse) -> Value {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(&response.body).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&response.body).into_owned())
    })
}
