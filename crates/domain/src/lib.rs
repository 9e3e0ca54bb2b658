//! Lyceum Domain - Core types
//!
//! This crate defines the domain model for the Lyceum API client:
//! requests, normalized errors, credentials, UI-facing state snapshots
//! and the learning resources served by the backend.
//! All types here are pure Rust with no I/O dependencies.

pub mod api_error;
pub mod auth;
pub mod error;
pub mod page;
pub mod request;
pub mod resources;
pub mod state;

pub use api_error::{ApiError, ErrorBody, FieldError};
pub use auth::{
    ACCESS_TOKEN_KEY, AuthResponse, Credentials, LoginRequest, REFRESH_TOKEN_KEY, RegisterRequest,
    User, UserRole,
};
pub use error::{DomainError, DomainResult};
pub use page::Page;
pub use request::{ApiRequest, HttpMethod};
pub use resources::{Course, ExamType, PracticeExam, Resource, Subject, Topic};
pub use state::{BatchState, PaginationState, RequestPhase, RequestState};
