//! Remote task execution service
//!
//! The federated clustering runs on a remote platform. This module holds
//! the service interface ([`TaskService`]), its request/response models and
//! the HTTP implementation used in production ([`HttpTaskService`]).

pub mod client;
pub mod http;
pub mod models;

use thiserror::Error;

pub use client::TaskService;
pub use http::HttpTaskService;
pub use models::{ResultEntry, TaskHandle, TaskSpec, TaskStatus};

/// Errors returned by the remote service transport
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Request attempted without a token
    #[error("Not authenticated with the remote service")]
    NotAuthenticated,

    /// Credentials rejected
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Service could not be reached or the request failed in transit
    #[error("Network error: {0}")]
    Network(String),

    /// Request did not complete in time
    #[error("Remote call timed out")]
    Timeout,

    /// Non-success response
    #[error("Remote service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::Serialization(e.to_string())
        } else {
            RemoteError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Serialization(e.to_string())
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
