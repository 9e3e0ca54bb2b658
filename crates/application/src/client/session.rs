//! Authentication state machine of one client.

use lyceum_domain::ApiRequest;

/// Whether the client still considers its session live.
///
/// A fresh client is `Authenticated` until a 401 proves otherwise; the
/// forced-logout redirect fires only on the transition out of this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Credentials are assumed valid.
    #[default]
    Authenticated,
    /// Credentials were cleared after a terminal 401 or a logout.
    Unauthenticated,
}

impl SessionState {
    /// Returns true while the session is considered live.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// A request travelling through the 401 path.
///
/// `auth_retried` is set once the request has been replayed after a token
/// refresh, so a second 401 is always terminal.
#[derive(Debug, Clone, Copy)]
pub struct AuthAttempt<'a> {
    /// The request being sent.
    pub request: &'a ApiRequest,
    /// Whether a refresh-and-replay already happened.
    pub auth_retried: bool,
}

impl<'a> AuthAttempt<'a> {
    /// First attempt for `request`.
    #[must_use]
    pub const fn new(request: &'a ApiRequest) -> Self {
        Self {
            request,
            auth_retried: false,
        }
    }

    /// The same request, flagged as replayed after a refresh.
    #[must_use]
    pub const fn replayed(self) -> Self {
        Self {
            request: self.request,
            auth_retried: true,
        }
    }
}
