//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::graphql::{build_schema, TransitSchema};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance, used directly by the health check
    pub repository: Arc<dyn FullRepository>,
    /// Schema built once over the same repository
    pub schema: TransitSchema,
}

impl AppState {
    /// Build the GraphQL schema over `repository` and wrap both.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        let schema = build_schema(Arc::clone(&repository));
        Self { repository, schema }
    }
}
