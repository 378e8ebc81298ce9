//! # Tembea Jiji
//!
//! Transit backend: bus routes, the stops passengers board at, and the named
//! stages along each route, served through one GraphQL endpoint.
//!
//! ## Architecture
//!
//! - [`models`]: Route, BusStop and Stage records and their id types
//! - [`db`]: Repository traits, in-memory and Postgres backends, and the
//!   service layer that validates references before writing
//! - [`graphql`]: async-graphql schema (queries and mutations)
//! - [`http`]: axum server exposing `/graphql` and `/health`
//!
//! ## Example
//!
//! ```
//! use tembea_jiji::db::RepositoryFactory;
//! use tembea_jiji::graphql::build_schema;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let schema = build_schema(RepositoryFactory::create_local());
//! let response = schema.execute("{ routes { id routeNumber } }").await;
//! assert!(response.errors.is_empty());
//! # });
//! ```

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod graphql;
pub mod models;

#[cfg(feature = "http-server")]
pub mod http;
