//! Bus stop repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{BusStop, BusStopId, NewBusStop, RouteId};

/// Storage operations for bus stops.
#[async_trait]
pub trait BusStopRepository: Send + Sync {
    /// Fetch a bus stop by id, or `NotFound`.
    async fn get_bus_stop(&self, stop_id: BusStopId) -> RepositoryResult<BusStop>;

    /// List all bus stops ordered by `stop_name`.
    async fn list_bus_stops(&self) -> RepositoryResult<Vec<BusStop>>;

    /// List the bus stops owned by a route, ordered by `stop_name`.
    async fn list_bus_stops_for_route(&self, route_id: RouteId) -> RepositoryResult<Vec<BusStop>>;

    /// Persist a new bus stop.
    ///
    /// Fails with `ValidationError` when the owning route does not exist.
    async fn insert_bus_stop(&self, stop: &NewBusStop) -> RepositoryResult<BusStop>;

    /// Replace every field of an existing bus stop.
    ///
    /// Fails with `NotFound` for an unknown stop and `ValidationError` for an
    /// unknown owning route.
    async fn update_bus_stop(
        &self,
        stop_id: BusStopId,
        stop: &NewBusStop,
    ) -> RepositoryResult<BusStop>;
}
