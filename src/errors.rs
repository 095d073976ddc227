/*!
 * Error types for the napisub library.
 *
 * Each component boundary has its own error enum built with thiserror:
 * - `PayloadError`: the binary subtitle container could not be turned into text
 * - `ProviderError`: the network collaborator failed (timeouts, HTTP errors, cancellation)
 * - `CatalogError`: the search/download pipeline failed
 */

use thiserror::Error;

/// Errors that can occur while decoding a downloaded subtitle payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The response carried no payload bytes at all
    #[error("No subtitle payload in response")]
    NoPayload,

    /// The container is shorter than its fixed header and checksum
    #[error("Subtitle container truncated: {0} bytes")]
    Truncated(usize),

    /// The CRC-32 stored in the container does not match its content
    #[error("Checksum mismatch: stored {expected:08x}, computed {actual:08x}")]
    Checksum {
        /// Checksum stored in the container
        expected: u32,
        /// Checksum computed over the decrypted body
        actual: u32,
    },

    /// The decrypted body is not a valid raw deflate stream
    #[error("Failed to decompress subtitle payload: {0}")]
    Decompress(String),

    /// The download envelope could not be read
    #[error("Malformed download envelope: {0}")]
    Envelope(String),
}

impl PayloadError {
    /// Whether the payload arrived but was damaged in transit.
    ///
    /// Corrupted payloads are worth one more download attempt, missing ones are not.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Checksum { .. } | Self::Decompress(_) | Self::Truncated(_))
    }
}

/// Errors that can occur when talking to the catalog service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Error when making a request fails
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Error returned by the remote service itself
    #[error("Service responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message or body excerpt
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request or its deadline ran out of time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// The response body could not be interpreted
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ProviderError {
    /// Whether a fresh attempt of the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::Timeout(_) | Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::Cancelled | Self::ParseError(_) => false,
        }
    }
}

/// Errors that can occur in the catalog search and download pipeline
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Error from the network collaborator
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error decoding a downloaded payload
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// No catalog entry matched the query
    #[error("No catalog match for {0}")]
    NoMatch(String),

    /// A single detail-page row could not be parsed
    #[error("Unparseable row: {0}")]
    UnparseableRow(String),

    /// The query does not carry enough information to search
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}
