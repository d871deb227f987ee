//! Core module: configuration, shared state and the HTTP server
//!
//! - [`Config`] - server configuration
//! - [`ServerState`] - engine singletons shared by every handler
//! - [`Server`] - HTTP server

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
