//! Shared result and error types for MES Office API tooling
//!
//! This crate provides the vocabulary every API client operation speaks:
//!
//! - **Outcome**: a success/failure wrapper returned instead of `Err` for
//!   expected failure paths
//! - **Error taxonomy**: fixed error codes mapped from HTTP status codes,
//!   serialized with the names the server contracts use
//!
//! # Example
//!
//! ```rust
//! use mes_core::{ErrorCode, Failure, Outcome};
//!
//! let outcome: Outcome<u32> = Failure::from_status(404, "not found").into();
//!
//! match outcome {
//!     Outcome::Success(value) => println!("got {value}"),
//!     Outcome::Failure(failure) => assert_eq!(failure.code, ErrorCode::ResourceNotFound),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod outcome;

pub use error::{ErrorCode, Failure, FailureReport};
pub use outcome::Outcome;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ErrorCode, Failure, FailureReport, API_CLIENT_SOURCE};
    pub use crate::outcome::Outcome;
}
