//! GraphQL API for routes, bus stops and stages.
//!
//! ## Schema
//!
//! - **Queries**: `route`, `routes`, `busStop`, `busStops`, `stage`, `stages`
//! - **Mutations**: `createRoute`, `updateRoute`, `createBusStop`,
//!   `updateBusStop`, `createStage`, `updateStage`
//!
//! Resolvers delegate to [`crate::db::services`]. A rejected mutation comes
//! back as `{ ok: false, <entity>: null }`; storage failures surface as
//! GraphQL errors.

mod mutation;
mod query;
mod schema;
mod types;

pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use schema::{build_schema, TransitSchema};
pub use types::*;
