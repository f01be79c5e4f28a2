//! HTTP client for the MES Office REST API
//!
//! This crate provides typed access to the MES Office API with authentication
//! handled transparently.
//!
//! # Features
//!
//! - **Bearer token authentication**: tokens are requested for a service
//!   identity, cached, refreshed five minutes before expiry and renewed once
//!   when the API answers 401
//! - **Uniform results**: every call returns a [`mes_core::Outcome`], with
//!   HTTP statuses mapped to fixed error codes
//! - **Generic resource client**: CRUD, search, bulk and workflow routes for
//!   every collection in the [`Entity`] catalog
//! - **Request correlation**: every request carries an `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use mes_api_client::{Entity, MesClient, Outcome, WorkflowAction};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create client with environment configuration
//!     let client = MesClient::new()?;
//!
//!     // List warehouses
//!     match client.entity(Entity::Warehouses).get_all().await {
//!         Outcome::Success(items) => println!("{} warehouses", items.len()),
//!         Outcome::Failure(failure) => eprintln!("{failure}"),
//!     }
//!
//!     // Approve a sales order for company 2
//!     let orders = client.with_company_id(2).entity(Entity::SalesOrders);
//!     let approved = orders.transition(42, WorkflowAction::Approve, &json!({})).await;
//!     println!("approved: {}", approved.is_success());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod query;
pub mod resource;
pub mod test_data;

pub use auth::{AuthHandler, CachedToken, TokenProvider};
pub use client::MesClient;
pub use config::{AuthConfig, ClientConfig};
pub use endpoints::{CodeSegment, Entity, EntityGroup, WorkflowAction};
pub use error::{ApiError, ApiResult};
pub use mes_core::{ErrorCode, Failure, Outcome};
pub use query::{QueryParams, SortDirection};
pub use resource::ResourceClient;
pub use test_data::{filter_test_data, is_test_data};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::MesClient;
    pub use crate::config::ClientConfig;
    pub use crate::endpoints::{Entity, WorkflowAction};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::query::QueryParams;
    pub use crate::resource::ResourceClient;
    pub use mes_core::prelude::*;
}
