//! Error types for agentdesk.
//!
//! This module defines all error types used throughout the agentdesk crate.
//! The HTTP layer maps these onto status codes in `server::error`.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for agentdesk operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Client Store Errors ===
    /// No client with the given id exists in the store.
    #[error("client not found: {id}")]
    ClientNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// A client with the given id is already stored.
    #[error("client already exists: {id}")]
    DuplicateClient {
        /// The conflicting id.
        id: String,
    },

    /// The client record was rejected before reaching the store.
    #[error("invalid client: {message}")]
    InvalidClient {
        /// Why the record was rejected.
        message: String,
    },

    /// Failed to read a store file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write or replace a store file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Server Errors ===
    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the server tried to listen on.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Server(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for agentdesk operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a client-not-found error.
    #[must_use]
    pub fn client_not_found(id: impl Into<String>) -> Self {
        Self::ClientNotFound { id: id.into() }
    }

    /// Create a duplicate-client error.
    #[must_use]
    pub fn duplicate_client(id: impl Into<String>) -> Self {
        Self::DuplicateClient { id: id.into() }
    }

    /// Create an invalid-client error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Create a new server error.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the requested client does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ClientNotFound { .. })
    }

    /// Check if this error is an id conflict.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateClient { .. })
    }
}
