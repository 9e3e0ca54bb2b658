//! Login, registration and logout against the backend.

use std::sync::Arc;

use futures::future::BoxFuture;
use lyceum_domain::{ApiError, AuthResponse, LoginRequest, RegisterRequest, User};

use crate::client::ApiClient;
use crate::ports::{HttpTransport, SessionHandle};

/// Login endpoint.
pub const LOGIN_ENDPOINT: &str = "/auth/login";
/// Registration endpoint.
pub const REGISTER_ENDPOINT: &str = "/auth/register";
/// Current-account endpoint.
pub const ME_ENDPOINT: &str = "/auth/me";

/// Stateful authentication service.
///
/// Holds no state of its own: credentials live in the client's token
/// storage, so several services built on the same client agree on who is
/// signed in.
pub struct AuthService<C: HttpTransport> {
    client: Arc<ApiClient<C>>,
}

impl<C: HttpTransport> AuthService<C> {
    /// Creates the service on top of a shared client.
    #[must_use]
    pub const fn new(client: Arc<ApiClient<C>>) -> Self {
        Self { client }
    }

    /// Signs in, stores the issued tokens and returns the account.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or a storage error if tokens cannot be saved.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, ApiError> {
        let response: AuthResponse = self.client.post(LOGIN_ENDPOINT, request).await?;
        self.start_session(response).await
    }

    /// Creates an account, stores the issued tokens and returns it.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or a storage error if tokens cannot be saved.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let response: AuthResponse = self.client.post(REGISTER_ENDPOINT, request).await?;
        self.start_session(response).await
    }

    /// Drops the local session. No request is made.
    ///
    /// # Errors
    ///
    /// Returns a storage error if tokens cannot be removed.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.client.clear_credentials().await?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Fetches the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; a 401 also ends the session.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.client.get(ME_ENDPOINT).await
    }

    /// Returns true while an access token is stored.
    ///
    /// # Errors
    ///
    /// Returns a storage error if tokens cannot be read.
    pub async fn is_authenticated(&self) -> Result<bool, ApiError> {
        Ok(self.client.credentials().await?.is_some())
    }

    async fn start_session(&self, response: AuthResponse) -> Result<User, ApiError> {
        self.client.store_credentials(&response.credentials()).await?;
        tracing::info!(user_id = response.user.id, role = ?response.user.role, "signed in");
        Ok(response.user)
    }
}

impl<C: HttpTransport> SessionHandle for AuthService<C> {
    fn logout(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Err(error) = self.client.clear_credentials().await {
                tracing::warn!(error = %error, "logout after 401 failed");
            }
        })
    }
}
