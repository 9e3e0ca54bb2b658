//! Session collaborators: navigation, token refresh and logout.

use futures::future::BoxFuture;
use lyceum_domain::{ApiError, Credentials};

/// Performs client-side navigation.
///
/// The API client calls this once when a session is torn down after a 401.
pub trait Navigator: Send + Sync {
    /// Navigates to `path`, discarding the current view.
    fn redirect(&self, path: &str);
}

/// Exchanges a refresh token for new credentials.
pub trait TokenRefresher: Send + Sync {
    /// Refreshes the session.
    ///
    /// # Errors
    ///
    /// Any error makes the 401 terminal.
    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> BoxFuture<'a, Result<Credentials, ApiError>>;
}

/// Logout side effect used by request handles when a call ends in 401.
pub trait SessionHandle: Send + Sync {
    /// Drops the local session.
    fn logout(&self) -> BoxFuture<'_, ()>;
}
