//! HTTP handlers.
//!
//! GraphQL requests go straight to the schema held in [`AppState`]; the
//! remaining handlers are plain JSON endpoints.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::Uri,
    response::{Html, IntoResponse},
    Json,
};

use super::dto::HealthResponse;
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;

/// GraphQL endpoint path, shared by the router and the GraphiQL page.
pub const GRAPHQL_PATH: &str = "/graphql";

/// GET /health
///
/// Reports the service as up and the repository as reachable or not. Storage
/// failures are reported in the body; the endpoint itself still answers 200.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        timestamp: chrono::Utc::now(),
    })
}

/// POST /graphql
pub async fn graphql(State(state): State<AppState>, request: GraphQLRequest) -> GraphQLResponse {
    state.schema.execute(request.into_inner()).await.into()
}

/// GET /graphql
///
/// Interactive GraphiQL page pointed at the POST endpoint.
pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
