//! Route repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{NewRoute, Route, RouteDeletion, RouteId};

/// Storage operations for routes.
///
/// Implementations must be `Send + Sync` to be shared across request handlers.
#[async_trait]
pub trait RouteRepository: Send + Sync {
    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is healthy
    /// - `Ok(false)` if it is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Fetch a route by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no route has this id
    async fn get_route(&self, route_id: RouteId) -> RepositoryResult<Route>;

    /// List all routes ordered by `route_number`.
    async fn list_routes(&self) -> RepositoryResult<Vec<Route>>;

    /// Persist a new route and move the listed children onto it.
    ///
    /// Route insertion and child attachment happen as one write. Referenced
    /// children are expected to exist; callers validate them beforehand.
    async fn insert_route(&self, route: &NewRoute) -> RepositoryResult<Route>;

    /// Overwrite a route's number and move the listed children onto it.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the route does not exist
    async fn update_route(&self, route_id: RouteId, route: &NewRoute) -> RepositoryResult<Route>;

    /// Delete a route together with every bus stop and stage it owns.
    ///
    /// # Returns
    /// * `Ok(RouteDeletion)` - Counts of the removed children
    /// * `Err(RepositoryError::NotFound)` - If the route does not exist
    async fn delete_route(&self, route_id: RouteId) -> RepositoryResult<RouteDeletion>;
}
