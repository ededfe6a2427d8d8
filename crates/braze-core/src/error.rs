//! Unified error types for the Braze core contracts.
//!
//! Adapter crates reuse these types so hosts can handle failures uniformly
//! regardless of which platform an adapter talks to.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while validating adapter configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A required option is absent or empty.
    #[error("missing required option: {0}")]
    MissingOption(&'static str),

    /// An option is present but unusable.
    #[error("invalid adapter configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// API Errors
// =============================================================================

/// Errors that can occur while calling a platform Web API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The HTTP request itself failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform accepted the request but reported an error code.
    #[error("platform returned error: {code}")]
    Platform {
        /// Platform-reported error code (e.g. Slack's `channel_not_found`).
        code: String,
    },

    /// Request or response (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A response was missing an expected field.
    #[error("missing field in response: {0}")]
    MissingField(&'static str),

    /// No credential could be resolved for the given team/workspace.
    #[error("no token available for team '{team}'")]
    NoToken {
        /// The team the call was destined for.
        team: String,
    },
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Adapter Errors
// =============================================================================

/// Errors that can occur in adapter operations.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// An inbound payload could not be parsed.
    #[error("failed to parse inbound payload: {reason}")]
    Parse {
        /// Reason for failure.
        reason: String,
    },

    /// The activity cannot be delivered by this adapter.
    #[error("activity not supported: {reason}")]
    Unsupported {
        /// Reason for failure.
        reason: String,
    },

    /// An activity field required by the operation is absent.
    #[error("activity is missing {0}")]
    MissingActivityField(&'static str),

    /// A lifecycle method was called before the adapter was initialized.
    #[error("adapter not initialized: {0}")]
    NotInitialized(&'static str),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Web API error.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AdapterError {
    /// Creates a parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Creates an unsupported-activity error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for Web API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
