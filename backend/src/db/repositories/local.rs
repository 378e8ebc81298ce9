//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory using HashMaps behind a single lock, so every write (including a
//! route insert plus child attachment) is applied atomically.

use async_trait::async_trait;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    BusStop, BusStopId, NewBusStop, NewRoute, NewStage, Route, RouteDeletion, RouteId, Stage,
    StageId,
};

/// In-memory local repository.
///
/// # Example
/// ```
/// use tembea_jiji::db::repositories::LocalRepository;
/// use tembea_jiji::db::repository::RouteRepository;
/// use tembea_jiji::models::NewRoute;
///
/// # tokio_test_block_on(async {
/// let repo = LocalRepository::new();
/// let route = repo
///     .insert_route(&NewRoute { route_number: "46".into(), ..Default::default() })
///     .await
///     .unwrap();
/// assert_eq!(repo.route_count(), 1);
/// assert_eq!(route.route_number, "46");
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    routes: HashMap<RouteId, Route>,
    bus_stops: HashMap<BusStopId, BusStop>,
    stages: HashMap<StageId, Stage>,

    // ID counters
    next_route_id: i64,
    next_bus_stop_id: i64,
    next_stage_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
            bus_stops: HashMap::new(),
            stages: HashMap::new(),
            next_route_id: 1,
            next_bus_stop_id: 1,
            next_stage_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn require_route(&self, route_id: RouteId, operation: &str) -> RepositoryResult<()> {
        if self.routes.contains_key(&route_id) {
            return Ok(());
        }
        Err(RepositoryError::validation_with_context(
            format!("Route {} does not exist", route_id),
            ErrorContext::new(operation)
                .with_entity("route")
                .with_entity_id(route_id),
        ))
    }

    /// Move the listed children onto `route_id`. Unknown ids are skipped.
    fn attach_children(&mut self, route_id: RouteId, route: &NewRoute) {
        for stop_id in &route.stop_ids {
            if let Some(stop) = self.bus_stops.get_mut(stop_id) {
                stop.route_id = route_id;
            }
        }
        for stage_id in &route.stage_ids {
            if let Some(stage) = self.stages.get_mut(stage_id) {
                stage.route_id = route_id;
            }
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    ///
    /// While unhealthy every operation except `health_check` fails with a
    /// connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository and reset id counters.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
    }

    pub fn route_count(&self) -> usize {
        self.data.read().routes.len()
    }

    pub fn bus_stop_count(&self) -> usize {
        self.data.read().bus_stops.len()
    }

    pub fn stage_count(&self) -> usize {
        self.data.read().stages.len()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, LocalData>> {
        let data = self.data.read();
        if !data.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(data)
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, LocalData>> {
        let data = self.data.write();
        if !data.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(data)
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(entity: &str, id: impl std::fmt::Display, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("{} {} not found", entity, id),
        ErrorContext::new(operation)
            .with_entity(entity.to_lowercase().replace(' ', "_"))
            .with_entity_id(id),
    )
}

fn sorted_bus_stops<'a>(stops: impl Iterator<Item = &'a BusStop>) -> Vec<BusStop> {
    let mut stops: Vec<BusStop> = stops.cloned().collect();
    stops.sort_by(|a, b| a.stop_name.cmp(&b.stop_name).then(a.id.cmp(&b.id)));
    stops
}

fn sorted_stages<'a>(stages: impl Iterator<Item = &'a Stage>) -> Vec<Stage> {
    let mut stages: Vec<Stage> = stages.cloned().collect();
    stages.sort_by(|a, b| a.stage_name.cmp(&b.stage_name).then(a.id.cmp(&b.id)));
    stages
}

#[async_trait]
impl RouteRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn get_route(&self, route_id: RouteId) -> RepositoryResult<Route> {
        let data = self.read()?;
        data.routes
            .get(&route_id)
            .cloned()
            .ok_or_else(|| not_found("Route", route_id, "get_route"))
    }

    async fn list_routes(&self) -> RepositoryResult<Vec<Route>> {
        let data = self.read()?;
        let mut routes: Vec<Route> = data.routes.values().cloned().collect();
        routes.sort_by(|a, b| a.route_number.cmp(&b.route_number).then(a.id.cmp(&b.id)));
        Ok(routes)
    }

    async fn insert_route(&self, route: &NewRoute) -> RepositoryResult<Route> {
        let mut data = self.write()?;
        let route_id = RouteId::new(data.next_route_id);
        data.next_route_id += 1;

        let record = Route {
            id: route_id,
            route_number: route.route_number.clone(),
        };
        data.routes.insert(route_id, record.clone());
        data.attach_children(route_id, route);

        Ok(record)
    }

    async fn update_route(&self, route_id: RouteId, route: &NewRoute) -> RepositoryResult<Route> {
        let mut data = self.write()?;
        let record = data
            .routes
            .get_mut(&route_id)
            .ok_or_else(|| not_found("Route", route_id, "update_route"))?;
        record.route_number = route.route_number.clone();
        let updated = record.clone();

        data.attach_children(route_id, route);
        Ok(updated)
    }

    async fn delete_route(&self, route_id: RouteId) -> RepositoryResult<RouteDeletion> {
        let mut data = self.write()?;
        if data.routes.remove(&route_id).is_none() {
            return Err(not_found("Route", route_id, "delete_route"));
        }

        let stops_before = data.bus_stops.len();
        data.bus_stops.retain(|_, stop| stop.route_id != route_id);
        let stages_before = data.stages.len();
        data.stages.retain(|_, stage| stage.route_id != route_id);

        Ok(RouteDeletion {
            route_id,
            bus_stops_removed: stops_before - data.bus_stops.len(),
            stages_removed: stages_before - data.stages.len(),
        })
    }
}

#[async_trait]
impl BusStopRepository for LocalRepository {
    async fn get_bus_stop(&self, stop_id: BusStopId) -> RepositoryResult<BusStop> {
        let data = self.read()?;
        data.bus_stops
            .get(&stop_id)
            .cloned()
            .ok_or_else(|| not_found("Bus stop", stop_id, "get_bus_stop"))
    }

    async fn list_bus_stops(&self) -> RepositoryResult<Vec<BusStop>> {
        let data = self.read()?;
        Ok(sorted_bus_stops(data.bus_stops.values()))
    }

    async fn list_bus_stops_for_route(&self, route_id: RouteId) -> RepositoryResult<Vec<BusStop>> {
        let data = self.read()?;
        Ok(sorted_bus_stops(
            data.bus_stops.values().filter(|s| s.route_id == route_id),
        ))
    }

    async fn insert_bus_stop(&self, stop: &NewBusStop) -> RepositoryResult<BusStop> {
        let mut data = self.write()?;
        data.require_route(stop.route_id, "insert_bus_stop")?;

        let stop_id = BusStopId::new(data.next_bus_stop_id);
        data.next_bus_stop_id += 1;

        let record = stop.clone().into_record(stop_id);
        data.bus_stops.insert(stop_id, record.clone());
        Ok(record)
    }

    async fn update_bus_stop(
        &self,
        stop_id: BusStopId,
        stop: &NewBusStop,
    ) -> RepositoryResult<BusStop> {
        let mut data = self.write()?;
        if !data.bus_stops.contains_key(&stop_id) {
            return Err(not_found("Bus stop", stop_id, "update_bus_stop"));
        }
        data.require_route(stop.route_id, "update_bus_stop")?;

        let record = stop.clone().into_record(stop_id);
        data.bus_stops.insert(stop_id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl StageRepository for LocalRepository {
    async fn get_stage(&self, stage_id: StageId) -> RepositoryResult<Stage> {
        let data = self.read()?;
        data.stages
            .get(&stage_id)
            .cloned()
            .ok_or_else(|| not_found("Stage", stage_id, "get_stage"))
    }

    async fn list_stages(&self) -> RepositoryResult<Vec<Stage>> {
        let data = self.read()?;
        Ok(sorted_stages(data.stages.values()))
    }

    async fn list_stages_for_route(&self, route_id: RouteId) -> RepositoryResult<Vec<Stage>> {
        let data = self.read()?;
        Ok(sorted_stages(
            data.stages.values().filter(|s| s.route_id == route_id),
        ))
    }

    async fn insert_stage(&self, stage: &NewStage) -> RepositoryResult<Stage> {
        let mut data = self.write()?;
        data.require_route(stage.route_id, "insert_stage")?;

        let stage_id = StageId::new(data.next_stage_id);
        data.next_stage_id += 1;

        let record = stage.clone().into_record(stage_id);
        data.stages.insert(stage_id, record.clone());
        Ok(record)
    }

    async fn update_stage(&self, stage_id: StageId, stage: &NewStage) -> RepositoryResult<Stage> {
        let mut data = self.write()?;
        if !data.stages.contains_key(&stage_id) {
            return Err(not_found("Stage", stage_id, "update_stage"));
        }
        data.require_route(stage.route_id, "update_stage")?;

        let record = stage.clone().into_record(stage_id);
        data.stages.insert(stage_id, record.clone());
        Ok(record)
    }
}
