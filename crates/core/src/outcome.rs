//! Success/failure wrapper returned by every API client operation
//!
//! Expected failures (bad status codes, unreachable servers, cancelled calls)
//! are values, not errors: callers branch on [`Outcome`] instead of handling a
//! `Result::Err` from deep inside the HTTP stack.

use crate::error::{ErrorCode, Failure};
use serde::{Deserialize, Serialize};

/// Result of one API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
#[must_use = "an Outcome may be a Failure that should be inspected"]
pub enum Outcome<T> {
    /// The call succeeded and produced a value
    Success(T),
    /// The call failed; see [`Failure::code`] for the classification
    Failure(Failure),
}

impl<T> Outcome<T> {
    /// Wrap a value
    pub fn success(value: T) -> Self {
        Self::Success(value)
    }

    /// Build a failure from a code and message
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure(Failure::new(code, message))
    }

    /// Whether the call succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the call failed
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Borrow the success value
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Borrow the failure
    #[must_use]
    pub fn failure_ref(&self) -> Option<&Failure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Error code of a failed call
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.failure_ref().map(|f| f.code)
    }

    /// Error message of a failed call
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.failure_ref().map(|f| f.message.as_str())
    }

    /// Transform the success value, keeping failures untouched
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }

    /// Chain another fallible step
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Success(value) => f(value),
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }

    /// Convert into a standard `Result` so `?` can be used
    ///
    /// # Errors
    ///
    /// Returns the [`Failure`] if the call failed.
    pub fn into_result(self) -> Result<T, Failure> {
        self.into()
    }

    /// Discard the failure
    #[must_use]
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, Failure> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Result<T, Failure>> for Outcome<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}

impl<T> From<Failure> for Outcome<T> {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}
