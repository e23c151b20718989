//! Error types for ReadKit

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during API and tool operations
#[derive(Debug, Error)]
pub enum ReaderError {
    /// API token is missing
    #[error("Missing Readwise access token: set READWISE_TOKEN or pass --token")]
    MissingToken,

    /// Tool argument failed validation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Tool name is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Upstream returned 429
    #[error("Rate limit exceeded. Too many requests. Please retry after {} seconds.", .retry_after.as_secs())]
    RateLimited {
        /// Delay requested by the `Retry-After` header
        retry_after: Duration,
    },

    /// Upstream returned a non-2xx, non-429 status
    #[error("Readwise API error: {status} {reason} - {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase
        reason: String,
        /// Response body
        body: String,
    },

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    DecodeError(String),
}

impl ReaderError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReaderError::Timeout
        } else if err.is_connect() {
            ReaderError::ConnectError(err)
        } else {
            ReaderError::RequestError(err.to_string())
        }
    }

    /// Retry delay when the upstream asked the caller to back off
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ReaderError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Failure of a single content-acquisition strategy
///
/// Never surfaced to tool callers: the resolver logs it and moves on.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Remote answered with a non-success status
    #[error("{source_name} returned HTTP {status}")]
    Status {
        /// Strategy or service that failed
        source_name: &'static str,
        /// HTTP status code
        status: u16,
    },

    /// Transport-level failure
    #[error("{source_name} request failed: {message}")]
    Request {
        /// Strategy or service that failed
        source_name: &'static str,
        /// Error detail
        message: String,
    },

    /// Strategy had nothing to fetch
    #[error("{0}: no usable URL")]
    MissingUrl(&'static str),
}

/// Word-segmentation dictionary could not be loaded
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// Word list file could not be read
    #[error("Failed to read word list {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Word list contained no usable words
    #[error("Word list is empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ReaderError::MissingToken.to_string(),
            "Missing Readwise access token: set READWISE_TOKEN or pass --token"
        );
        assert_eq!(
            ReaderError::RateLimited {
                retry_after: Duration::from_secs(30)
            }
            .to_string(),
            "Rate limit exceeded. Too many requests. Please retry after 30 seconds."
        );
        assert_eq!(
            ReaderError::Upstream {
                status: 404,
                reason: "Not Found".to_string(),
                body: "{\"detail\":\"missing\"}".to_string(),
            }
            .to_string(),
            "Readwise API error: 404 Not Found - {\"detail\":\"missing\"}"
        );
        assert_eq!(
            ReaderError::UnknownTool("nope".to_string()).to_string(),
            "Unknown tool: nope"
        );
    }

    #[test]
    fn test_retry_after() {
        let err = ReaderError::RateLimited {
            retry_after: Duration::from_secs(12),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
        assert_eq!(ReaderError::Timeout.retry_after(), None);
    }

    #[test]
    fn test_content_error_messages() {
        let err = ContentError::Status {
            source_name: "render_proxy",
            status: 502,
        };
        assert_eq!(err.to_string(), "render_proxy returned HTTP 502");
        assert_eq!(
            ContentError::MissingUrl("live_html").to_string(),
            "live_html: no usable URL"
        );
    }
}
