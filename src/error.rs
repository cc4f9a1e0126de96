//! Error types for the extraction pipeline.
//!
//! Every stage returns [`Result`]; nothing is caught or retried inside the
//! crate. Callers (the DAG tasks or the standalone binary) decide what a
//! failed run means.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Transport or HTTP failure: connection refused, timeout, non-2xx status,
    /// or a body that could not be read as JSON.
    #[error("upstream request to {endpoint} failed: {message}")]
    UpstreamRequest {
        /// Upstream endpoint name (e.g. "playlistItems")
        endpoint: &'static str,
        /// Human-readable failure description
        message: String,
        /// HTTP status when the server answered
        status: Option<u16>,
    },

    /// The response was valid JSON but lacked a field the pipeline needs.
    #[error("unexpected response shape from {endpoint}: {message}")]
    UpstreamShape {
        /// Upstream endpoint name
        endpoint: &'static str,
        /// What was missing or malformed
        message: String,
    },

    /// The playlist kept returning continuation cursors past the page guard.
    #[error("playlist {playlist} still had more pages after {max_pages} requests")]
    PaginationLimitExceeded {
        /// Playlist being paginated
        playlist: String,
        /// Configured page ceiling
        max_pages: usize,
    },

    /// Configuration error with the offending key
    #[error("configuration error ({key}): {message}")]
    Config {
        /// Environment variable or setting name
        key: String,
        /// What is wrong with it
        message: String,
    },

    /// An enrichment worker stopped (panicked) without reporting a result
    #[error("enrichment worker for chunk {chunk} stopped without a result")]
    WorkerLost {
        /// Chunk the worker was fetching
        chunk: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse error category, one per exception type exposed to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Request,
    Shape,
    PaginationLimit,
    Config,
    Io,
    Internal,
}

impl Error {
    pub(crate) fn shape(endpoint: &'static str, message: impl Into<String>) -> Self {
        Error::UpstreamShape {
            endpoint,
            message: message.into(),
        }
    }

    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Build an [`Error::UpstreamRequest`] from a reqwest failure.
    ///
    /// The URL is stripped: its query string carries the API key.
    pub(crate) fn request(endpoint: &'static str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        Error::UpstreamRequest {
            endpoint,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UpstreamRequest { .. } => ErrorKind::Request,
            Error::UpstreamShape { .. } => ErrorKind::Shape,
            Error::PaginationLimitExceeded { .. } => ErrorKind::PaginationLimit,
            Error::Config { .. } => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::WorkerLost { .. } | Error::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Whether this error came from the transport layer.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Error::UpstreamRequest { .. })
    }

    /// Whether this error came from a malformed upstream response.
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Error::UpstreamShape { .. })
    }
}
