//! Transport client: auth-token lifecycle, retry policy and error normalization.

mod api_client;
mod retry;
mod session;

pub use api_client::ApiClient;
pub use retry::RetryPolicy;
pub use session::{AuthAttempt, SessionState};
