//! Authentication module.
//!
//! This module provides:
//! - In-memory token storage
//! - The login/registration/logout service

mod service;
mod token_store;

pub use service::{AuthService, LOGIN_ENDPOINT, ME_ENDPOINT, REGISTER_ENDPOINT};
pub use token_store::MemoryTokenStorage;
