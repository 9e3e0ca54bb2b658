//! Deterministic JSON serialization for files written by the client.
//!
//! Keeps stored files stable between writes by:
//! - Sorting object keys alphabetically (via `BTreeMap` in stored types)
//! - Using 2-space indentation
//! - Adding trailing newline

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
