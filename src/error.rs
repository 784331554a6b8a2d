//! Error types for dircast
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (extraction, query, streaming)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! A corrupt embedded metadata payload is deliberately *not* represented
//! here: the extractor swallows it and treats the payload as absent, so a
//! half-written vendor blob degrades a single item instead of failing it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dircast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dircast
#[derive(Debug, Error)]
pub enum Error {
    /// Stat or open failed for a file the library believed to exist
    #[error("file unavailable: {path}: {source}")]
    FileUnavailable {
        /// The file that could not be read
        path: PathBuf,
        /// The underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The tag-parsing collaborator could not make sense of a file
    #[error("could not parse metadata for {path}: {message}")]
    UnparsableMetadata {
        /// The file whose tags failed to parse
        path: PathBuf,
        /// The underlying parse failure, stringified for diagnostics
        message: String,
    },

    /// Malformed filter or sort specification in a feed request
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Malformed or unsatisfiable byte-range header
    #[error("invalid byte range: {0}")]
    InvalidRange(String),

    /// Unknown item id for streaming/image requests
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// API error response format
///
/// Returned by API endpoints when an error occurs, with a machine-readable
/// error code, a human-readable message, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_query",
///     "message": "invalid query: malformatted sort option: sideways:title"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "invalid_query")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed filter/sort specs
            Error::InvalidQuery(_) => 400,

            // 404 Not Found - unknown ids, and files that vanished between
            // scan time and stream time
            Error::NotFound(_) => 404,
            Error::FileUnavailable { .. } => 404,

            // 416 Range Not Satisfiable
            Error::InvalidRange(_) => 416,

            // 422 Unprocessable Entity
            Error::UnparsableMetadata { .. } => 422,

            // 500 Internal Server Error
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::FileUnavailable { .. } => "file_unavailable",
            Error::UnparsableMetadata { .. } => "unparsable_metadata",
            Error::InvalidQuery(_) => "invalid_query",
            Error::InvalidRange(_) => "invalid_range",
            Error::NotFound(_) => "not_found",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::FileUnavailable { path, .. } => Some(serde_json::json!({
                "path": path,
            })),
            Error::UnparsableMetadata { path, .. } => Some(serde_json::json!({
                "path": path,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
