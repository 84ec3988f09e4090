//! Error types for the IPAM DNS synchronizer
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for synchronizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the synchronizer
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed address, or no address where one was required
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Address family other than IPv4 or IPv6
    #[error("Unsupported address family: {0}")]
    UnsupportedFamily(String),

    /// The DNS management API rejected or failed a call
    #[error("DNS API error ({provider}): {message}")]
    Api {
        /// Provider name
        provider: String,
        /// Transport or status detail
        message: String,
    },

    /// A plan step failed; later steps were not attempted
    #[error("Step {step}/{total} failed ({operation}): {source}")]
    StepFailed {
        /// 1-based index of the failing step
        step: usize,
        /// Number of steps in the plan
        total: usize,
        /// Human-readable form of the failing operation
        operation: String,
        /// Underlying API error
        #[source]
        source: Box<Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Webhook signature did not verify
    #[error("Signature verification failed: {0}")]
    Signature(String),

    /// The per-event deadline expired
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl Error {
    /// Create an invalid address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create an unsupported family error
    pub fn unsupported_family(msg: impl Into<String>) -> Self {
        Self::UnsupportedFamily(msg.into())
    }

    /// Create an API error attributed to a provider
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a signature error
    pub fn signature(msg: impl Into<String>) -> Self {
        Self::Signature(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Whether the error was caused by the request content rather than by
    /// the DNS API or the service itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_)
                | Self::UnsupportedFamily(_)
                | Self::Json(_)
                | Self::Signature(_)
        )
    }
}
