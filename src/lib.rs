//! AgroConecta client core
//!
//! This library provides the client-side messaging core of AgroConecta, a
//! marketplace connecting agricultural producers and workers. It holds the
//! conversation state machine, the messaging controller, the message template
//! engine, and the compose-screen logic shared by the mobile frontends
//! (Android, iOS, Desktop).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod controller;
pub mod model;
pub mod screens;
pub mod store;
pub mod templates;
pub mod transport;

/// Result type alias for AgroConecta core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for AgroConecta core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Authentication/session error
    #[error("Auth error: {0}")]
    Auth(String),

    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] transport::ApiError),

    /// Local cache/storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}

/// Initialize the AgroConecta core library with logging
pub fn init() {
    tracing_subscriber::fmt::init();
}
