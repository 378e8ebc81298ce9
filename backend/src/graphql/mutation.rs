use async_graphql::{Context, Object, Result};

use super::types::{
    repository, BusStopInput, BusStopPayload, RouteInput, RoutePayload, StageInput, StagePayload,
};
use crate::db::services::{self, MutationOutcome, RouteFields};
use crate::models::{BusStopId, RouteId, StageId};

/// Create and update entry points.
///
/// Every mutation returns `ok` plus the written record; a rejected mutation
/// writes nothing and returns `ok: false` with a null record.
#[derive(Debug, Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create a route and attach the referenced stops and stages.
    async fn create_route(&self, ctx: &Context<'_>, input: RouteInput) -> Result<RoutePayload> {
        let repo = repository(ctx)?;
        let outcome = services::create_route(repo.as_ref(), RouteFields::from(input)).await?;
        Ok(outcome.into())
    }

    /// Rename a route and replace its stops and stages.
    async fn update_route(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: RouteInput,
    ) -> Result<RoutePayload> {
        let repo = repository(ctx)?;
        let outcome =
            services::update_route(repo.as_ref(), RouteId::new(id), RouteFields::from(input))
                .await?;
        Ok(outcome.into())
    }

    async fn create_bus_stop(
        &self,
        ctx: &Context<'_>,
        input: BusStopInput,
    ) -> Result<BusStopPayload> {
        let repo = repository(ctx)?;
        let outcome = match input.into_fields() {
            Some(fields) => services::create_bus_stop(repo.as_ref(), fields).await?,
            None => MutationOutcome::failure(),
        };
        Ok(outcome.into())
    }

    async fn update_bus_stop(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: BusStopInput,
    ) -> Result<BusStopPayload> {
        let repo = repository(ctx)?;
        let outcome = match input.into_fields() {
            Some(fields) => {
                services::update_bus_stop(repo.as_ref(), BusStopId::new(id), fields).await?
            }
            None => MutationOutcome::failure(),
        };
        Ok(outcome.into())
    }

    async fn create_stage(&self, ctx: &Context<'_>, input: StageInput) -> Result<StagePayload> {
        let repo = repository(ctx)?;
        let outcome = match input.into_fields() {
            Some(fields) => services::create_stage(repo.as_ref(), fields).await?,
            None => MutationOutcome::failure(),
        };
        Ok(outcome.into())
    }

    async fn update_stage(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: StageInput,
    ) -> Result<StagePayload> {
        let repo = repository(ctx)?;
        let outcome = match input.into_fields() {
            Some(fields) => services::update_stage(repo.as_ref(), StageId::new(id), fields).await?,
            None => MutationOutcome::failure(),
        };
        Ok(outcome.into())
    }
}
