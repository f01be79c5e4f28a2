//! Error types for the API client
//!
//! These are the errors of the client's own machinery (configuration, token
//! acquisition, request construction). Failures of individual API operations
//! are reported as [`mes_core::Outcome::Failure`] instead.

use thiserror::Error;

/// Result type alias for API client operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Environment variable present but unusable
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar {
        /// Variable name
        name: String,
        /// Raw value that failed to parse
        value: String,
    },

    /// The authentication endpoint refused or returned no usable token
    #[error("Failed to authenticate with API: {message}")]
    Authentication {
        /// HTTP status, when the endpoint answered at all
        status: Option<u16>,
        /// Explanation or raw response body
        message: String,
    },

    /// Authentication is disabled in the configuration
    #[error("Authentication is disabled for this client")]
    AuthenticationDisabled,
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid env var error
    pub fn invalid_env(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Authentication {
            status,
            message: message.into(),
        }
    }

    /// Check if the token endpoint could not be reached at all
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_display() {
        let err = ApiError::authentication(Some(500), "boom");
        assert_eq!(err.to_string(), "Failed to authenticate with API: boom");
        assert!(!err.is_unreachable());
    }

    #[test]
    fn test_invalid_env_display() {
        let err = ApiError::invalid_env("MES_TIMEOUT_SECS", "soon");
        assert!(err.to_string().contains("MES_TIMEOUT_SECS"));
        assert!(err.to_string().contains("soon"));
    }
}
