//! Shared types for the tipping platform
//!
//! Common types used by the tip server and its clients: data models,
//! error codes, response envelopes and id generation.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
