//! Error taxonomy for failed API operations
//!
//! Every failed call against the MES Office API is classified into one of a
//! fixed set of [`ErrorCode`]s. The codes serialize to the same
//! SCREAMING_SNAKE names the server-side contracts use, so a [`Failure`] can be
//! logged, displayed or forwarded without translation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default value for [`Failure::source`] when produced by the HTTP layer
pub const API_CLIENT_SOURCE: &str = "ApiClient";

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request errors
    /// HTTP 400
    ValidationError,
    /// HTTP 422, distinct from a plain bad request
    ValidationFailed,
    /// HTTP 409
    Conflict,

    // Access errors
    /// HTTP 401
    AuthFailed,
    /// HTTP 403
    ForbiddenResource,
    /// HTTP 404
    ResourceNotFound,

    // Integration errors
    /// HTTP 500
    #[serde(rename = "INT_EXTERNAL_SYNC_FAILED")]
    ExternalSyncFailed,
    /// HTTP 502 and every transport-level failure
    #[serde(rename = "INT_API_UNAVAILABLE")]
    ApiUnavailable,
    /// HTTP 503
    #[serde(rename = "INT_SERVICE_UNAVAILABLE")]
    ServiceUnavailable,
    /// HTTP 504
    #[serde(rename = "INT_TIMEOUT")]
    Timeout,
    /// Any status without a dedicated code
    #[serde(rename = "INTEGRATION_EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError,

    // Client-side
    /// The caller cancelled the operation
    OperationCanceled,
}

impl ErrorCode {
    /// Map a non-success HTTP status code to its error code
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::ValidationError,
            401 => Self::AuthFailed,
            403 => Self::ForbiddenResource,
            404 => Self::ResourceNotFound,
            409 => Self::Conflict,
            422 => Self::ValidationFailed,
            500 => Self::ExternalSyncFailed,
            502 => Self::ApiUnavailable,
            503 => Self::ServiceUnavailable,
            504 => Self::Timeout,
            _ => Self::ExternalServiceError,
        }
    }

    /// Stable wire name, identical to the serde representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::Conflict => "CONFLICT",
            Self::AuthFailed => "AUTH_FAILED",
            Self::ForbiddenResource => "FORBIDDEN_RESOURCE",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ExternalSyncFailed => "INT_EXTERNAL_SYNC_FAILED",
            Self::ApiUnavailable => "INT_API_UNAVAILABLE",
            Self::ServiceUnavailable => "INT_SERVICE_UNAVAILABLE",
            Self::Timeout => "INT_TIMEOUT",
            Self::ExternalServiceError => "INTEGRATION_EXTERNAL_SERVICE_ERROR",
            Self::OperationCanceled => "OPERATION_CANCELED",
        }
    }

    /// Get a human-readable category
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::ValidationError | Self::ValidationFailed | Self::Conflict => "Request",
            Self::AuthFailed | Self::ForbiddenResource | Self::ResourceNotFound => "Access",
            Self::ExternalSyncFailed
            | Self::ApiUnavailable
            | Self::ServiceUnavailable
            | Self::Timeout
            | Self::ExternalServiceError => "Integration",
            Self::OperationCanceled => "Client",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure branch of an [`Outcome`](crate::Outcome)
///
/// `context` is diagnostic only (endpoint, status code, elapsed time); nothing
/// downstream should depend on its keys for correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Component that produced the failure
    pub source: String,
    /// Additional diagnostics
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl Failure {
    /// Create a new failure attributed to the API client
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: API_CLIENT_SOURCE.to_string(),
            context: BTreeMap::new(),
        }
    }

    /// Set the component the failure is attributed to
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Add one diagnostic entry
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Look up a diagnostic entry
    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.context.get(key)
    }

    /// Build the failure for a non-success HTTP status
    ///
    /// The raw body is only echoed in the message for statuses where it
    /// usually carries the server's explanation (400, 409, 422, 500 and
    /// unmapped codes). A non-empty body is always kept as `response_body`
    /// context.
    pub fn from_status(status: u16, body: &str) -> Self {
        let code = ErrorCode::from_status(status);
        let message = match code {
            ErrorCode::ValidationError => format!("Bad request: {body}"),
            ErrorCode::AuthFailed => "Authentication required".to_string(),
            ErrorCode::ForbiddenResource => "Access forbidden".to_string(),
            ErrorCode::ResourceNotFound => "Resource not found".to_string(),
            ErrorCode::Conflict => format!("Conflict: {body}"),
            ErrorCode::ValidationFailed => format!("Validation failed: {body}"),
            ErrorCode::ExternalSyncFailed => format!("Server error: {body}"),
            ErrorCode::ApiUnavailable => "API unavailable".to_string(),
            ErrorCode::ServiceUnavailable => "Service unavailable".to_string(),
            ErrorCode::Timeout => "Request timeout".to_string(),
            ErrorCode::ExternalServiceError | ErrorCode::OperationCanceled => {
                format!("HTTP {status}: {body}")
            }
        };
        let failure = Self::new(code, message).with_context("status_code", status);
        if body.trim().is_empty() {
            failure
        } else {
            failure.with_context("response_body", body)
        }
    }

    /// Failure for a call that never produced a usable response
    pub fn unavailable(error: impl fmt::Display) -> Self {
        Self::new(ErrorCode::ApiUnavailable, format!("API request failed: {error}"))
    }

    /// Failure for a call the caller cancelled
    pub fn canceled() -> Self {
        Self::new(ErrorCode::OperationCanceled, "Request canceled")
    }

    /// Convert to a serializable report
    #[must_use]
    pub fn to_report(&self) -> FailureReport {
        FailureReport {
            code: self.code,
            category: self.code.category().to_string(),
            message: self.message.clone(),
            source: self.source.clone(),
            context: self.context.clone(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Failure {}

/// Serializable failure report for logging and CLI output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub code: ErrorCode,
    pub category: String,
    pub message: String,
    pub source: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_is_exact() {
        let table = [
            (400, ErrorCode::ValidationError),
            (401, ErrorCode::AuthFailed),
            (403, ErrorCode::ForbiddenResource),
            (404, ErrorCode::ResourceNotFound),
            (409, ErrorCode::Conflict),
            (422, ErrorCode::ValidationFailed),
            (500, ErrorCode::ExternalSyncFailed),
            (502, ErrorCode::ApiUnavailable),
            (503, ErrorCode::ServiceUnavailable),
            (504, ErrorCode::Timeout),
            (418, ErrorCode::ExternalServiceError),
            (501, ErrorCode::ExternalServiceError),
        ];

        for (status, expected) in table {
            assert_eq!(ErrorCode::from_status(status), expected, "status {status}");
        }
    }

    #[test]
    fn test_wire_names_match_serde() {
        for code in [
            ErrorCode::ValidationError,
            ErrorCode::ExternalSyncFailed,
            ErrorCode::ServiceUnavailable,
            ErrorCode::ExternalServiceError,
            ErrorCode::OperationCanceled,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_body_echoed_only_for_explanatory_statuses() {
        assert_eq!(
            Failure::from_status(409, "duplicate code").message,
            "Conflict: duplicate code"
        );
        assert_eq!(
            Failure::from_status(422, "qty < 0").message,
            "Validation failed: qty < 0"
        );
        assert_eq!(Failure::from_status(403, "secret detail").message, "Access forbidden");
        assert_eq!(Failure::from_status(418, "teapot").message, "HTTP 418: teapot");
    }

    #[test]
    fn test_body_kept_as_context() {
        let failure = Failure::from_status(404, "Order SO-7 does not exist");
        assert_eq!(failure.message, "Resource not found");
        assert_eq!(
            failure.context_value("response_body"),
            Some(&serde_json::json!("Order SO-7 does not exist"))
        );

        assert!(Failure::from_status(503, "").context_value("response_body").is_none());
    }

    #[test]
    fn test_failure_context() {
        let failure = Failure::from_status(404, "not found").with_context("endpoint", "api/widgets/42");

        assert_eq!(failure.source, API_CLIENT_SOURCE);
        assert_eq!(failure.context_value("status_code"), Some(&serde_json::json!(404)));
        assert_eq!(
            failure.context_value("endpoint"),
            Some(&serde_json::json!("api/widgets/42"))
        );
        assert_eq!(failure.to_string(), "[RESOURCE_NOT_FOUND] Resource not found");
    }

    #[test]
    fn test_report_serialization() {
        let report = Failure::canceled().to_report();
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("OPERATION_CANCELED"));
        assert!(json.contains("Client"));
        assert!(!json.contains("context"));
    }
}
