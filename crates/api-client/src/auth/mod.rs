//! Bearer token authentication
//!
//! - [`TokenProvider`] obtains tokens from `POST /api/auth/token` and caches
//!   the most recent one
//! - [`AuthHandler`] attaches them to outgoing requests and retries once when
//!   the API answers 401

pub mod handler;
pub mod token;

pub use handler::{AuthHandler, COMPANY_ID_HEADER};
pub use token::{CachedToken, TokenProvider, TOKEN_ENDPOINT};
