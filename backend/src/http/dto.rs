//! JSON bodies for the non-GraphQL endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Crate version
    pub version: String,
    /// `connected`, `disconnected` or `error: <message>`
    pub database: String,
    pub timestamp: DateTime<Utc>,
}
