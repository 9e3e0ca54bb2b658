//! Lyceum Application - Client core and ports
//!
//! This crate defines the application layer with:
//! - Port traits (transport, token storage, navigation, refresh, logout)
//! - The resilient [`ApiClient`] with its retry policy and 401 handling
//! - Request-state handles for UI code ([`ApiCall`], [`BatchCall`], [`PaginatedCall`])
//! - Stateful services built on the client ([`AuthService`], [`ResourceService`])
//! - Application-level configuration and error handling

pub mod auth;
pub mod calls;
pub mod client;
pub mod config;
pub mod error;
pub mod ports;
pub mod resources;

#[cfg(test)]
mod test_support;

pub use auth::{AuthService, MemoryTokenStorage};
pub use calls::{ApiCall, BatchCall, BatchMode, LoadOutcome, PaginatedCall, PaginationOptions};
pub use client::{ApiClient, AuthAttempt, RetryPolicy, SessionState};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApplicationError, ApplicationResult};
pub use ports::{
    HttpTransport, Navigator, SessionHandle, StorageError, TokenRefresher, TokenStorage,
    TransportError, TransportRequest, TransportResponse,
};
pub use resources::{
    CourseService, ExamTypeService, PracticeExamService, ResourceService, SubjectService,
    TopicService,
};
