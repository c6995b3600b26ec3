//! Error types for appliance operations.

use thiserror::Error;

use crate::store::ResourceKind;

/// Errors that can occur while driving the appliance.
///
/// Every variant is terminal for the step that raised it. Nothing is retried:
/// repeating a create call on the appliance would duplicate resources.
#[derive(Debug, Error)]
pub enum IxError {
    /// A create reply was not JSON or did not carry `links[].href`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A resource kind outside the fixed set was requested.
    #[error("invalid resource kind: {0}")]
    InvalidKind(String),

    /// No statistics view exports the flow statistics file.
    #[error("statistics view '{0}' not found")]
    StatisticsViewNotFound(String),

    /// The statistics table shape does not match its captions.
    #[error("malformed statistics: {0}")]
    MalformedStatistics(String),

    /// A step needs more predecessor resources than the store holds.
    #[error("{kind} not ready: need {needed}, have {available}")]
    DependencyNotReady {
        kind: ResourceKind,
        needed: usize,
        available: usize,
    },

    /// A traffic item needs a destination and a source endpoint.
    #[error("traffic item needs at least 2 endpoints, got {0}")]
    InvalidEndpoints(usize),

    /// The traffic run was cancelled during its wait.
    #[error("traffic run cancelled")]
    Cancelled,

    /// The appliance answered with a non-success status.
    #[error("{method} {path} failed with status {status}: {body}")]
    Http {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// The login reply carried no API key.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// HTTP transport failure.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local file I/O failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for appliance operations.
pub type Result<T> = std::result::Result<T, IxError>;
