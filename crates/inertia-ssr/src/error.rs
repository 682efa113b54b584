//! SSR error types.

use thiserror::Error;

/// Errors that can occur while rendering through the sidecar.
#[derive(Error, Debug)]
pub enum SsrError {
    /// The configured URL could not be used.
    #[error("Invalid SSR URL: {0}")]
    InvalidUrl(String),

    /// Failed to serialize the page.
    #[error("Failed to encode page: {0}")]
    Encode(#[source] serde_json::Error),

    /// The sidecar could not be reached.
    #[error("SSR connection error: {0}")]
    Connection(String),

    /// The call did not finish in time.
    #[error("SSR request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The sidecar answered with a 4xx or 5xx status.
    #[error("Bad SSR status code: {status}")]
    BadStatus { status: u16 },

    /// The reply body was not a valid render result.
    #[error("Failed to decode SSR response: {0}")]
    Decode(String),
}

impl SsrError {
    /// Check if the sidecar was never reached or did not answer in time.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}
