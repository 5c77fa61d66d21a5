//! Project host error types

use thiserror::Error;

/// Failures reported by a project host
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid host base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Authentication rejected by host (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Host returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode host response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl HostError {
    /// Check if the failure is tied to a single resource rather than the host as a whole
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound(_))
    }
}
