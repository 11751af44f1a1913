//! Pilotage - a client library for the Pilotage Micro API.
//!
//! This library provides the core functionality for the `pm` CLI tool:
//! session and authentication management, the HTTP adapter for the REST
//! backend, and local configuration/state handling.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod session;

pub use api::ApiError;

/// Library-level error type for Pilotage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] api::ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A mutating operation completed after the session it belonged to
    /// was already torn down; its result was discarded.
    #[error("Session terminée pendant l'opération")]
    Superseded,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Pilotage operations.
pub type Result<T> = std::result::Result<T, Error>;
