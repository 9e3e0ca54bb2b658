//! Lyceum Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus the environment loader
//! and tracing bootstrap used by the binary.

pub mod adapters;
pub mod config;
pub mod navigation;
pub mod persistence;
pub mod serialization;
pub mod telemetry;

pub use adapters::ReqwestTransport;
pub use config::Settings;
pub use lyceum_application::auth::MemoryTokenStorage;
pub use navigation::ChannelNavigator;
pub use persistence::FileTokenStorage;
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
