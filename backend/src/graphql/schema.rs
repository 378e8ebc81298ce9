use std::sync::Arc;

use async_graphql::{EmptySubscription, Schema};

use super::{MutationRoot, QueryRoot};
use crate::db::FullRepository;

/// Executable schema for the transit API.
pub type TransitSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Nesting cap. Leaves room for the GraphiQL introspection query.
const MAX_QUERY_DEPTH: usize = 32;

/// Build the schema around a repository handle.
///
/// The repository is stored as schema data and shared by every request.
pub fn build_schema(repository: Arc<dyn FullRepository>) -> TransitSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(repository)
        .limit_depth(MAX_QUERY_DEPTH)
        .finish()
}
