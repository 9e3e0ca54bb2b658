//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the client core and the outside
//! world. Each port is a trait implemented by adapters in the
//! infrastructure layer, or by test doubles.

mod http_transport;
mod session;
mod token_storage;

pub use http_transport::{HttpTransport, TransportError, TransportRequest, TransportResponse};
pub use session::{Navigator, SessionHandle, TokenRefresher};
pub use token_storage::{StorageError, TokenStorage};
