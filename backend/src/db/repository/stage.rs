//! Stage repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{NewStage, RouteId, Stage, StageId};

/// Storage operations for stages. Mirrors [`super::BusStopRepository`].
#[async_trait]
pub trait StageRepository: Send + Sync {
    async fn get_stage(&self, stage_id: StageId) -> RepositoryResult<Stage>;

    /// List all stages ordered by `stage_name`.
    async fn list_stages(&self) -> RepositoryResult<Vec<Stage>>;

    async fn list_stages_for_route(&self, route_id: RouteId) -> RepositoryResult<Vec<Stage>>;

    async fn insert_stage(&self, stage: &NewStage) -> RepositoryResult<Stage>;

    async fn update_stage(&self, stage_id: StageId, stage: &NewStage) -> RepositoryResult<Stage>;
}
