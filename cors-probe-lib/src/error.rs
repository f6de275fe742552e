//! Error handling for CORS probing operations.
//!
//! Most failures during a scan are absorbed where they happen (a bad URL
//! skips the URL, a failed request skips the candidate). This type carries
//! the ones that surface to callers: opening input, loading configuration
//! and building the HTTP client.

use std::fmt;
use std::time::Duration;

/// Main error type for CORS probing operations.
#[derive(Debug, Clone)]
pub enum CorsProbeError {
    /// A URL line that cannot be turned into a request
    InvalidUrl {
        url: String,
        reason: String,
    },

    /// Network-related errors (connection, TLS, client construction)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// A request did not complete within the configured timeout
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// File I/O errors when opening a URL list or config file
    FileError {
        path: String,
        message: String,
    },

    /// Configuration errors (invalid settings, unparsable TOML)
    ConfigError {
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl CorsProbeError {
    /// Create a new invalid URL error.
    pub fn invalid_url<U: Into<String>, R: Into<String>>(url: U, reason: R) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl fmt::Display for CorsProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { url, reason } => {
                write!(f, "Invalid URL '{}': {}", url, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for CorsProbeError {}

impl CorsProbeError {
    /// Classify a failed HTTP request.
    ///
    /// reqwest does not report the limit that expired, so the caller passes
    /// the timeout the client was built with.
    pub fn request(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::timeout("HTTP request", timeout)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_builder() {
            Self::network_with_source("Failed to build request", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<toml::de::Error> for CorsProbeError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}
