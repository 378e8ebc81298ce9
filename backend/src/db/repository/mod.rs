//! Repository trait definitions for transit storage.
//!
//! Storage is split into one focused trait per record type. A backend
//! implements all three and automatically gains [`FullRepository`].
//!
//! - [`error`]: Error types for repository operations
//! - [`route`]: Routes, including child attachment and cascading deletion
//! - [`bus_stop`]: Bus stops
//! - [`stage`]: Stages
//!
//! Lookups by id signal a missing record with [`RepositoryError::NotFound`].
//! Listing operations return records in their default order (by name, then id).

pub mod bus_stop;
pub mod error;
pub mod route;
pub mod stage;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use bus_stop::BusStopRepository;
pub use route::RouteRepository;
pub use stage::StageRepository;

/// Composite trait bound for a complete repository implementation.
///
/// ```ignore
/// async fn stop_count<R: FullRepository + ?Sized>(repo: &R, route_id: RouteId) -> RepositoryResult<usize> {
///     repo.get_route(route_id).await?;
///     Ok(repo.list_bus_stops_for_route(route_id).await?.len())
/// }
/// ```
pub trait FullRepository: RouteRepository + BusStopRepository + StageRepository {}

impl<T> FullRepository for T where T: RouteRepository + BusStopRepository + StageRepository {}
