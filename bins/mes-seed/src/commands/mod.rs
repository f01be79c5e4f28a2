//! CLI command implementations

pub mod cleanup;
pub mod entities;
pub mod get;
pub mod probe;
pub mod token;
