//! Typed error hierarchy for the azure-oms crate.
//!
//! Every variant maps to a real system boundary:
//! - `Auth` covers the Azure AD token endpoint (rejected credentials or an
//!   unreachable identity provider).
//! - `Api` covers the management REST surface and keeps the response body,
//!   which carries the service's diagnostic error codes.
//! - `Network` wraps `reqwest::Error` for transport failures (DNS, TCP, TLS)
//!   that never produced an HTTP status.
//! - `Config` covers missing or unusable connection parameters. It is always
//!   raised before any network call is attempted.
//! - `Parse` wraps `serde_json::Error` for response bodies that are not the
//!   JSON shape we expect.

use reqwest::StatusCode;

/// Unified error type for all azure-oms library operations.
#[derive(Debug, thiserror::Error)]
pub enum OmsError {
    /// Authentication failure at the Azure AD token endpoint.
    ///
    /// Covers non-2xx responses (the `message` includes the AADSTS body),
    /// network failures reaching the endpoint, and token responses that
    /// could not be decoded.
    #[error("authentication failed: {message}")]
    Auth {
        /// Human-readable description, including HTTP status and Azure AD
        /// error body when available.
        message: String,
        /// The underlying transport or parse error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The target service returned a non-success HTTP status code.
    #[error("API error {status}: {body}")]
    Api {
        /// The HTTP status code returned by the service.
        status: StatusCode,
        /// The raw response body text, or an empty string if none was sent.
        body: String,
    },

    /// Connection parameters are missing or inconsistent.
    #[error("invalid configuration: {message}")]
    Config {
        /// What was missing or wrong.
        message: String,
        /// The underlying IO or TOML error when loading a config file.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON deserialization failed when decoding a response body.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A network-level failure occurred before any HTTP status was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl OmsError {
    /// Shorthand for a `Config` error with no underlying cause.
    pub(crate) fn config(message: impl Into<String>) -> Self {
        OmsError::Config {
            message: message.into(),
            source: None,
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, OmsError>;
