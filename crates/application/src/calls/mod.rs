//! Request-state handles for UI code.
//!
//! Each handle wraps async operations (usually service calls) and publishes
//! loading, data and error snapshots through a `tokio::sync::watch` channel.

mod api_call;
mod batch;
mod paginated;

pub use api_call::{ApiCall, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY};
pub use batch::{BatchCall, BatchMode};
pub use paginated::{LoadOutcome, PaginatedCall, PaginationOptions};
