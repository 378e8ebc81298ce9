use std::str::FromStr;
use std::sync::Arc;

use async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject, ID};

use crate::db::services::{self, BusStopFields, MutationOutcome, RouteFields, StageFields};
use crate::db::FullRepository;
use crate::models::{BusStop, BusStopId, Route, RouteId, Stage, StageId};

/// Repository handle stored in the schema data.
pub(crate) fn repository<'a>(ctx: &Context<'a>) -> Result<&'a Arc<dyn FullRepository>> {
    ctx.data::<Arc<dyn FullRepository>>()
}

/// Parse a GraphQL `ID` into a record id. Unparsable ids yield `None`.
pub(crate) fn parse_id<T: FromStr>(id: &ID) -> Option<T> {
    id.as_str().parse().ok()
}

// ==================== Outputs ====================

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Route", complex)]
pub struct RouteType {
    pub id: ID,
    pub route_number: String,
    #[graphql(skip)]
    pub key: RouteId,
}

#[ComplexObject]
impl RouteType {
    /// Bus stops owned by this route, ordered by name.
    async fn stops(&self, ctx: &Context<'_>) -> Result<Vec<BusStopType>> {
        let repo = repository(ctx)?;
        let stops = services::list_bus_stops_for_route(repo.as_ref(), self.key).await?;
        Ok(stops.iter().map(BusStopType::from).collect())
    }

    /// Stages owned by this route, ordered by name.
    async fn stages(&self, ctx: &Context<'_>) -> Result<Vec<StageType>> {
        let repo = repository(ctx)?;
        let stages = services::list_stages_for_route(repo.as_ref(), self.key).await?;
        Ok(stages.iter().map(StageType::from).collect())
    }
}

impl From<&Route> for RouteType {
    fn from(route: &Route) -> Self {
        Self {
            id: ID(route.id.to_string()),
            route_number: route.route_number.clone(),
            key: route.id,
        }
    }
}

async fn owning_route(ctx: &Context<'_>, route_id: RouteId) -> Result<RouteType> {
    let repo = repository(ctx)?;
    let route = services::get_route(repo.as_ref(), Some(route_id))
        .await?
        .ok_or_else(|| format!("Route {} not found", route_id))?;
    Ok(RouteType::from(&route))
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "BusStop", complex)]
pub struct BusStopType {
    pub id: ID,
    pub stop_name: String,
    pub lat: f64,
    pub lon: f64,
    #[graphql(skip)]
    pub route_id: RouteId,
}

#[ComplexObject]
impl BusStopType {
    /// The route this stop belongs to.
    async fn route(&self, ctx: &Context<'_>) -> Result<RouteType> {
        owning_route(ctx, self.route_id).await
    }
}

impl From<&BusStop> for BusStopType {
    fn from(stop: &BusStop) -> Self {
        Self {
            id: ID(stop.id.to_string()),
            stop_name: stop.stop_name.clone(),
            lat: stop.lat,
            lon: stop.lon,
            route_id: stop.route_id,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Stage", complex)]
pub struct StageType {
    pub id: ID,
    pub stage_name: String,
    pub lat: f64,
    pub lon: f64,
    #[graphql(skip)]
    pub route_id: RouteId,
}

#[ComplexObject]
impl StageType {
    /// The route this stage belongs to.
    async fn route(&self, ctx: &Context<'_>) -> Result<RouteType> {
        owning_route(ctx, self.route_id).await
    }
}

impl From<&Stage> for StageType {
    fn from(stage: &Stage) -> Self {
        Self {
            id: ID(stage.id.to_string()),
            stage_name: stage.stage_name.clone(),
            lat: stage.lat,
            lon: stage.lon,
            route_id: stage.route_id,
        }
    }
}

// ==================== Inputs ====================

/// Bus stop fields. Inside `RouteInput` only `id` is read, so a bare
/// `{id: "3"}` is a valid reference.
#[derive(Debug, Clone, Default, InputObject)]
pub struct BusStopInput {
    pub id: Option<ID>,
    pub stop_name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Owning route. Required on create; on update, omit to keep the current route.
    pub route_id: Option<ID>,
}

impl BusStopInput {
    /// `None` when a scalar is missing or `routeId` is not a valid id.
    pub(crate) fn into_fields(self) -> Option<BusStopFields> {
        Some(BusStopFields {
            stop_name: self.stop_name?,
            lat: self.lat?,
            lon: self.lon?,
            route_id: parse_owner(self.route_id.as_ref())?,
        })
    }
}

/// Stage fields. Inside `RouteInput` only `id` is read.
#[derive(Debug, Clone, Default, InputObject)]
pub struct StageInput {
    pub id: Option<ID>,
    pub stage_name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Owning route. Required on create; on update, omit to keep the current route.
    pub route_id: Option<ID>,
}

impl StageInput {
    /// `None` when a scalar is missing or `routeId` is not a valid id.
    pub(crate) fn into_fields(self) -> Option<StageFields> {
        Some(StageFields {
            stage_name: self.stage_name?,
            lat: self.lat?,
            lon: self.lon?,
            route_id: parse_owner(self.route_id.as_ref())?,
        })
    }
}

/// Outer `None` rejects an unparsable id; inner `None` means no owner given.
fn parse_owner(route_id: Option<&ID>) -> Option<Option<RouteId>> {
    match route_id {
        Some(id) => parse_id::<RouteId>(id).map(Some),
        None => Some(None),
    }
}

/// Route fields plus the children to attach, referenced by id.
#[derive(Debug, Clone, InputObject)]
pub struct RouteInput {
    pub id: Option<ID>,
    /// Stored as the route number.
    pub name: String,
    #[graphql(default)]
    pub stops: Vec<BusStopInput>,
    #[graphql(default)]
    pub stages: Vec<StageInput>,
}

impl From<RouteInput> for RouteFields {
    fn from(input: RouteInput) -> Self {
        Self {
            route_number: input.name,
            stop_ids: input
                .stops
                .iter()
                .map(|stop| stop.id.as_ref().and_then(parse_id::<BusStopId>))
                .collect(),
            stage_ids: input
                .stages
                .iter()
                .map(|stage| stage.id.as_ref().and_then(parse_id::<StageId>))
                .collect(),
        }
    }
}

// ==================== Payloads ====================

#[derive(Debug, Clone, SimpleObject)]
pub struct RoutePayload {
    pub ok: bool,
    pub route: Option<RouteType>,
}

impl From<MutationOutcome<Route>> for RoutePayload {
    fn from(outcome: MutationOutcome<Route>) -> Self {
        Self {
            ok: outcome.ok,
            route: outcome.record.as_ref().map(RouteType::from),
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct BusStopPayload {
    pub ok: bool,
    pub stop: Option<BusStopType>,
}

impl From<MutationOutcome<BusStop>> for BusStopPayload {
    fn from(outcome: MutationOutcome<BusStop>) -> Self {
        Self {
            ok: outcome.ok,
            stop: outcome.record.as_ref().map(BusStopType::from),
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct StagePayload {
    pub ok: bool,
    pub stage: Option<StageType>,
}

impl From<MutationOutcome<Stage>> for StagePayload {
    fn from(outcome: MutationOutcome<Stage>) -> Self {
        Self {
            ok: outcome.ok,
            stage: outcome.record.as_ref().map(StageType::from),
        }
    }
}
