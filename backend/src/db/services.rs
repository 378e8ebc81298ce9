//! Service layer: the operations the API exposes, on top of any repository.
//!
//! Reads pass straight through. Writes run the validate-then-write sequence:
//!
//! ```text
//! START -> resolve every reference -> all resolved? -> WRITE -> ok
//!                                  \-> no write -> failed outcome
//! ```
//!
//! A lookup that ends in [`RepositoryError::NotFound`] counts as "unresolved"
//! and turns the whole mutation into a failed [`MutationOutcome`]. Every
//! other repository error propagates unchanged.

use std::collections::HashSet;

use super::repository::{
    BusStopRepository, FullRepository, RepositoryError, RepositoryResult, RouteRepository,
    StageRepository,
};
use crate::models::{
    BusStop, BusStopId, NewBusStop, NewRoute, NewStage, Route, RouteDeletion, RouteId, Stage,
    StageId,
};

/// Result of a create or update.
///
/// `ok == false` means the mutation was rejected before anything was written.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    pub ok: bool,
    pub record: Option<T>,
}

impl<T> MutationOutcome<T> {
    pub fn success(record: T) -> Self {
        Self {
            ok: true,
            record: Some(record),
        }
    }

    pub fn failure() -> Self {
        Self {
            ok: false,
            record: None,
        }
    }
}

/// Route write request.
///
/// A `None` child id stands for a reference that was absent or could not be
/// parsed; it never resolves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteFields {
    pub route_number: String,
    pub stop_ids: Vec<Option<BusStopId>>,
    pub stage_ids: Vec<Option<StageId>>,
}

/// Bus stop write request. `route_id` is required on create and optional
/// (keep the current owner) on update.
#[derive(Debug, Clone, PartialEq)]
pub struct BusStopFields {
    pub stop_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: Option<RouteId>,
}

/// Stage write request, same ownership rules as [`BusStopFields`].
#[derive(Debug, Clone, PartialEq)]
pub struct StageFields {
    pub stage_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: Option<RouteId>,
}

/// Map `NotFound` to `Ok(None)`; keep every other error.
fn found<T>(result: RepositoryResult<T>) -> RepositoryResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RepositoryError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if the backing store is reachable.
pub async fn health_check<R: RouteRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Reads ====================

/// Fetch a route. An omitted id yields `None`; an unknown id is `NotFound`.
pub async fn get_route<R: RouteRepository + ?Sized>(
    repo: &R,
    route_id: Option<RouteId>,
) -> RepositoryResult<Option<Route>> {
    match route_id {
        Some(id) => repo.get_route(id).await.map(Some),
        None => Ok(None),
    }
}

pub async fn list_routes<R: RouteRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Route>> {
    repo.list_routes().await
}

/// Fetch a bus stop. An omitted id yields `None`; an unknown id is `NotFound`.
pub async fn get_bus_stop<R: BusStopRepository + ?Sized>(
    repo: &R,
    stop_id: Option<BusStopId>,
) -> RepositoryResult<Option<BusStop>> {
    match stop_id {
        Some(id) => repo.get_bus_stop(id).await.map(Some),
        None => Ok(None),
    }
}

pub async fn list_bus_stops<R: BusStopRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<BusStop>> {
    repo.list_bus_stops().await
}

pub async fn list_bus_stops_for_route<R: BusStopRepository + ?Sized>(
    repo: &R,
    route_id: RouteId,
) -> RepositoryResult<Vec<BusStop>> {
    repo.list_bus_stops_for_route(route_id).await
}

/// Fetch a stage. An omitted id yields `None`; an unknown id is `NotFound`.
pub async fn get_stage<R: StageRepository + ?Sized>(
    repo: &R,
    stage_id: Option<StageId>,
) -> RepositoryResult<Option<Stage>> {
    match stage_id {
        Some(id) => repo.get_stage(id).await.map(Some),
        None => Ok(None),
    }
}

pub async fn list_stages<R: StageRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Stage>> {
    repo.list_stages().await
}

pub async fn list_stages_for_route<R: StageRepository + ?Sized>(
    repo: &R,
    route_id: RouteId,
) -> RepositoryResult<Vec<Stage>> {
    repo.list_stages_for_route(route_id).await
}

// ==================== Route writes ====================

/// Resolve every child reference in input order.
///
/// Returns `None` at the first reference that is absent or unknown.
async fn resolve_children<R: FullRepository + ?Sized>(
    repo: &R,
    fields: &RouteFields,
) -> RepositoryResult<Option<(Vec<BusStopId>, Vec<StageId>)>> {
    let mut stop_ids = Vec::with_capacity(fields.stop_ids.len());
    for (index, stop_id) in fields.stop_ids.iter().enumerate() {
        let Some(stop_id) = stop_id else {
            log::warn!("Bus stop reference #{} has no usable id", index);
            return Ok(None);
        };
        if found(repo.get_bus_stop(*stop_id).await)?.is_none() {
            log::warn!("Bus stop {} does not exist", stop_id);
            return Ok(None);
        }
        stop_ids.push(*stop_id);
    }

    let mut stage_ids = Vec::with_capacity(fields.stage_ids.len());
    for (index, stage_id) in fields.stage_ids.iter().enumerate() {
        let Some(stage_id) = stage_id else {
            log::warn!("Stage reference #{} has no usable id", index);
            return Ok(None);
        };
        if found(repo.get_stage(*stage_id).await)?.is_none() {
            log::warn!("Stage {} does not exist", stage_id);
            return Ok(None);
        }
        stage_ids.push(*stage_id);
    }

    Ok(Some((stop_ids, stage_ids)))
}

/// Create a route and attach the referenced bus stops and stages to it.
///
/// Nothing is written unless every child reference resolves.
pub async fn create_route<R: FullRepository + ?Sized>(
    repo: &R,
    fields: RouteFields,
) -> RepositoryResult<MutationOutcome<Route>> {
    let Some((stop_ids, stage_ids)) = resolve_children(repo, &fields).await? else {
        log::warn!("create_route '{}' rejected: unresolved child", fields.route_number);
        return Ok(MutationOutcome::failure());
    };

    let route = repo
        .insert_route(&NewRoute {
            route_number: fields.route_number,
            stop_ids,
            stage_ids,
        })
        .await?;

    log::info!("Created route {} '{}'", route.id, route.route_number);
    Ok(MutationOutcome::success(route))
}

/// Replace a route's number and its child sets.
///
/// Rejected without a write when the route is unknown, a child reference does
/// not resolve, or a child the route owns today is missing from the new sets
/// (it would be left without an owner).
pub async fn update_route<R: FullRepository + ?Sized>(
    repo: &R,
    route_id: RouteId,
    fields: RouteFields,
) -> RepositoryResult<MutationOutcome<Route>> {
    if found(repo.get_route(route_id).await)?.is_none() {
        log::warn!("update_route rejected: route {} not found", route_id);
        return Ok(MutationOutcome::failure());
    }

    let Some((stop_ids, stage_ids)) = resolve_children(repo, &fields).await? else {
        log::warn!("update_route {} rejected: unresolved child", route_id);
        return Ok(MutationOutcome::failure());
    };

    let kept_stops: HashSet<BusStopId> = stop_ids.iter().copied().collect();
    let orphaned_stop = repo
        .list_bus_stops_for_route(route_id)
        .await?
        .into_iter()
        .find(|stop| !kept_stops.contains(&stop.id));
    if let Some(stop) = orphaned_stop {
        log::warn!(
            "update_route {} rejected: bus stop {} would lose its route",
            route_id,
            stop.id
        );
        return Ok(MutationOutcome::failure());
    }

    let kept_stages: HashSet<StageId> = stage_ids.iter().copied().collect();
    let orphaned_stage = repo
        .list_stages_for_route(route_id)
        .await?
        .into_iter()
        .find(|stage| !kept_stages.contains(&stage.id));
    if let Some(stage) = orphaned_stage {
        log::warn!(
            "update_route {} rejected: stage {} would lose its route",
            route_id,
            stage.id
        );
        return Ok(MutationOutcome::failure());
    }

    let updated = found(
        repo.update_route(
            route_id,
            &NewRoute {
                route_number: fields.route_number,
                stop_ids,
                stage_ids,
            },
        )
        .await,
    )?;

    Ok(match updated {
        Some(route) => {
            log::info!("Updated route {} '{}'", route.id, route.route_number);
            MutationOutcome::success(route)
        }
        // Deleted between validation and write.
        None => MutationOutcome::failure(),
    })
}

/// Delete a route and everything it owns. `None` when the route is unknown.
pub async fn delete_route<R: RouteRepository + ?Sized>(
    repo: &R,
    route_id: RouteId,
) -> RepositoryResult<Option<RouteDeletion>> {
    let deletion = found(repo.delete_route(route_id).await)?;
    if let Some(ref d) = deletion {
        log::info!(
            "Deleted route {} with {} bus stops and {} stages",
            d.route_id,
            d.bus_stops_removed,
            d.stages_removed
        );
    }
    Ok(deletion)
}

// ==================== Bus stop / stage writes ====================

/// Resolve the owner for a write. `fallback` is the current owner on update.
async fn resolve_owner<R: RouteRepository + ?Sized>(
    repo: &R,
    requested: Option<RouteId>,
    fallback: Option<RouteId>,
) -> RepositoryResult<Option<RouteId>> {
    match requested {
        Some(route_id) => Ok(found(repo.get_route(route_id).await)?.map(|route| route.id)),
        None => Ok(fallback),
    }
}

/// Create a bus stop owned by `fields.route_id`.
pub async fn create_bus_stop<R: FullRepository + ?Sized>(
    repo: &R,
    fields: BusStopFields,
) -> RepositoryResult<MutationOutcome<BusStop>> {
    let Some(route_id) = resolve_owner(repo, fields.route_id, None).await? else {
        log::warn!("create_bus_stop '{}' rejected: no valid route", fields.stop_name);
        return Ok(MutationOutcome::failure());
    };

    let stop = repo
        .insert_bus_stop(&NewBusStop {
            stop_name: fields.stop_name,
            lat: fields.lat,
            lon: fields.lon,
            route_id,
        })
        .await?;

    log::info!("Created bus stop {} on route {}", stop.id, stop.route_id);
    Ok(MutationOutcome::success(stop))
}

/// Overwrite a bus stop's name and position, optionally moving it to another route.
pub async fn update_bus_stop<R: FullRepository + ?Sized>(
    repo: &R,
    stop_id: BusStopId,
    fields: BusStopFields,
) -> RepositoryResult<MutationOutcome<BusStop>> {
    let Some(existing) = found(repo.get_bus_stop(stop_id).await)? else {
        log::warn!("update_bus_stop rejected: bus stop {} not found", stop_id);
        return Ok(MutationOutcome::failure());
    };

    let Some(route_id) = resolve_owner(repo, fields.route_id, Some(existing.route_id)).await?
    else {
        log::warn!("update_bus_stop {} rejected: no valid route", stop_id);
        return Ok(MutationOutcome::failure());
    };

    let updated = found(
        repo.update_bus_stop(
            stop_id,
            &NewBusStop {
                stop_name: fields.stop_name,
                lat: fields.lat,
                lon: fields.lon,
                route_id,
            },
        )
        .await,
    )?;

    Ok(updated.map_or_else(MutationOutcome::failure, |stop| {
        log::info!("Updated bus stop {}", stop.id);
        MutationOutcome::success(stop)
    }))
}

/// Create a stage owned by `fields.route_id`.
pub async fn create_stage<R: FullRepository + ?Sized>(
    repo: &R,
    fields: StageFields,
) -> RepositoryResult<MutationOutcome<Stage>> {
    let Some(route_id) = resolve_owner(repo, fields.route_id, None).await? else {
        log::warn!("create_stage '{}' rejected: no valid route", fields.stage_name);
        return Ok(MutationOutcome::failure());
    };

    let stage = repo
        .insert_stage(&NewStage {
            stage_name: fields.stage_name,
            lat: fields.lat,
            lon: fields.lon,
            route_id,
        })
        .await?;

    log::info!("Created stage {} on route {}", stage.id, stage.route_id);
    Ok(MutationOutcome::success(stage))
}

/// Overwrite a stage's name and position, optionally moving it to another route.
pub async fn update_stage<R: FullRepository + ?Sized>(
    repo: &R,
    stage_id: StageId,
    fields: StageFields,
) -> RepositoryResult<MutationOutcome<Stage>> {
    let Some(existing) = found(repo.get_stage(stage_id).await)? else {
        log::warn!("update_stage rejected: stage {} not found", stage_id);
        return Ok(MutationOutcome::failure());
    };

    let Some(route_id) = resolve_owner(repo, fields.route_id, Some(existing.route_id)).await?
    else {
        log::warn!("update_stage {} rejected: no valid route", stage_id);
        return Ok(MutationOutcome::failure());
    };

    let updated = found(
        repo.update_stage(
            stage_id,
            &NewStage {
                stage_name: fields.stage_name,
                lat: fields.lat,
                lon: fields.lon,
                route_id,
            },
        )
        .await,
    )?;

    Ok(updated.map_or_else(MutationOutcome::failure, |stage| {
        log::info!("Updated stage {}", stage.id);
        MutationOutcome::success(stage)
    }))
}
