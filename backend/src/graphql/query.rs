use async_graphql::{Context, Object, Result};

use super::types::{repository, BusStopType, RouteType, StageType};
use crate::db::services;
use crate::models::{BusStopId, RouteId, StageId};

/// Read-only entry points.
///
/// Single lookups return `null` for an omitted id. An unknown id is an error.
#[derive(Debug, Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn route(&self, ctx: &Context<'_>, id: Option<i64>) -> Result<Option<RouteType>> {
        let repo = repository(ctx)?;
        let route = services::get_route(repo.as_ref(), id.map(RouteId::new)).await?;
        Ok(route.as_ref().map(RouteType::from))
    }

    /// All routes ordered by route number.
    async fn routes(&self, ctx: &Context<'_>) -> Result<Vec<RouteType>> {
        let repo = repository(ctx)?;
        let routes = services::list_routes(repo.as_ref()).await?;
        Ok(routes.iter().map(RouteType::from).collect())
    }

    async fn bus_stop(&self, ctx: &Context<'_>, id: Option<i64>) -> Result<Option<BusStopType>> {
        let repo = repository(ctx)?;
        let stop = services::get_bus_stop(repo.as_ref(), id.map(BusStopId::new)).await?;
        Ok(stop.as_ref().map(BusStopType::from))
    }

    /// All bus stops ordered by name.
    async fn bus_stops(&self, ctx: &Context<'_>) -> Result<Vec<BusStopType>> {
        let repo = repository(ctx)?;
        let stops = services::list_bus_stops(repo.as_ref()).await?;
        Ok(stops.iter().map(BusStopType::from).collect())
    }

    async fn stage(&self, ctx: &Context<'_>, id: Option<i64>) -> Result<Option<StageType>> {
        let repo = repository(ctx)?;
        let stage = services::get_stage(repo.as_ref(), id.map(StageId::new)).await?;
        Ok(stage.as_ref().map(StageType::from))
    }

    /// All stages ordered by name.
    async fn stages(&self, ctx: &Context<'_>) -> Result<Vec<StageType>> {
        let repo = repository(ctx)?;
        let stages = services::list_stages(repo.as_ref()).await?;
        Ok(stages.iter().map(StageType::from).collect())
    }
}
