//! Storage for routes, bus stops and stages.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  API Layer (GraphQL resolvers, HTTP health)              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                             │
//! │  - Reference validation before writes                    │
//! │  - NotFound -> "unresolved" normalisation                │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────┐
//!     │  Local (in-memory) │  Postgres    │
//!     └──────────────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```ignore
//! use tembea_jiji::db::{services, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env().await?;
//!     let routes = services::list_routes(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

// Feature flag priority: postgres > local
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(test)]
#[path = "services_tests.rs"]
mod services_tests;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
/// Placeholder so factory signatures stay the same without the Postgres backend.
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use services::{
    create_bus_stop, create_route, create_stage, delete_route, get_bus_stop, get_route, get_stage,
    health_check, list_bus_stops, list_bus_stops_for_route, list_routes, list_stages,
    list_stages_for_route, update_bus_stop, update_route, update_stage, BusStopFields,
    MutationOutcome, RouteFields, StageFields,
};

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    BusStopRepository, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    RouteRepository, StageRepository,
};
