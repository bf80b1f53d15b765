//! Error types for control plane machine provider configs
//!
//! Decoding and construction errors are fatal to the current reconciliation
//! attempt. Injection and extraction never fail, so they have no variants here.

use thiserror::Error;

/// Unified error type for provider config handling
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Provider Spec Decoding
    // =========================================================================
    #[error("failed to decode provider spec: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("provider spec is empty")]
    EmptyProviderSpec,

    #[error("unknown fields in provider spec: {}", fields.join(", "))]
    UnknownFields { fields: Vec<String> },

    // =========================================================================
    // Platform Dispatch
    // =========================================================================
    #[error("unsupported platform type: {platform}")]
    UnsupportedPlatform { platform: String },

    // =========================================================================
    // Configuration
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    // =========================================================================
    // Serialization & IO
    // =========================================================================
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Action the calling reconcile loop should take on error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Requeue with exponential backoff
    RequeueWithBackoff,
    /// Don't requeue, wait for the machine spec or infrastructure to change
    NoRequeue,
}

impl Error {
    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Fetching the infrastructure can succeed on a later attempt
            Error::Kube(_) | Error::Io(_) => ErrorAction::RequeueWithBackoff,

            // The payload or platform will not fix itself
            Error::Decode(_)
            | Error::EmptyProviderSpec
            | Error::UnknownFields { .. }
            | Error::UnsupportedPlatform { .. }
            | Error::Configuration(_)
            | Error::Json(_)
            | Error::Yaml(_) => ErrorAction::NoRequeue,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::NoRequeue)
    }

    /// Check if this error comes from a malformed or drifted provider spec
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::Decode(_) | Error::EmptyProviderSpec | Error::UnknownFields { .. }
        )
    }
}

/// Result type alias for provider config handling
pub type Result<T> = std::result::Result<T, Error>;
