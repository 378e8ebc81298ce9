//! Postgres repository implementation using Diesel.
//!
//! Tables: `routes`, `bus_stops`, `stages`. Both child tables reference
//! `routes(id)` with `ON DELETE CASCADE`.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    BusStopRepository, ErrorContext, RepositoryError, RepositoryResult, RouteRepository,
    StageRepository,
};
use crate::models::{
    BusStop, BusStopId, NewBusStop, NewRoute, NewStage, Route, RouteDeletion, RouteId, Stage,
    StageId,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// See the module documentation for the variables read and their defaults.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times with exponential backoff when the
    /// error is retryable (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    log::debug!("Retrying database operation (attempt {})", attempt + 1);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::from(e).with_operation("get_connection");
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn with_context(
    entity: &str,
    id: impl ToString,
    operation: &str,
) -> impl Fn(diesel::result::Error) -> RepositoryError {
    let entity = entity.to_string();
    let id = id.to_string();
    let operation = operation.to_string();
    move |err| match map_diesel_error(err) {
        RepositoryError::NotFound { .. } => RepositoryError::not_found_with_context(
            format!("{} {} not found", entity, id),
            ErrorContext::new(operation.clone())
                .with_entity(entity.clone())
                .with_entity_id(id.clone()),
        ),
        other => other.with_operation(operation.clone()),
    }
}

/// Move the listed bus stops and stages onto `route_id`.
fn attach_children(
    conn: &mut PgConnection,
    route_id: i64,
    route: &NewRoute,
) -> RepositoryResult<()> {
    let stop_ids: Vec<i64> = route.stop_ids.iter().map(|id| id.value()).collect();
    if !stop_ids.is_empty() {
        diesel::update(bus_stops::table.filter(bus_stops::id.eq_any(stop_ids)))
            .set(bus_stops::route_id.eq(route_id))
            .execute(conn)
            .map_err(map_diesel_error)?;
    }

    let stage_ids: Vec<i64> = route.stage_ids.iter().map(|id| id.value()).collect();
    if !stage_ids.is_empty() {
        diesel::update(stages::table.filter(stages::id.eq_any(stage_ids)))
            .set(stages::route_id.eq(route_id))
            .execute(conn)
            .map_err(map_diesel_error)?;
    }

    Ok(())
}

#[async_trait]
impl RouteRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_route(&self, route_id: RouteId) -> RepositoryResult<Route> {
        self.with_conn(move |conn| {
            routes::table
                .find(route_id.value())
                .select(RouteRow::as_select())
                .first::<RouteRow>(conn)
                .map(Route::from)
                .map_err(with_context("route", route_id, "get_route"))
        })
        .await
    }

    async fn list_routes(&self) -> RepositoryResult<Vec<Route>> {
        self.with_conn(|conn| {
            let rows = routes::table
                .select(RouteRow::as_select())
                .order((routes::route_number.asc(), routes::id.asc()))
                .load::<RouteRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Route::from).collect())
        })
        .await
    }

    async fn insert_route(&self, route: &NewRoute) -> RepositoryResult<Route> {
        let route = route.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let inserted: RouteRow = diesel::insert_into(routes::table)
                    .values(&RouteChangeset {
                        route_number: route.route_number.clone(),
                    })
                    .returning(RouteRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                attach_children(tx, inserted.id, &route)?;
                Ok(Route::from(inserted))
            })
        })
        .await
    }

    async fn update_route(&self, route_id: RouteId, route: &NewRoute) -> RepositoryResult<Route> {
        let route = route.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let updated: RouteRow = diesel::update(routes::table.find(route_id.value()))
                    .set(&RouteChangeset {
                        route_number: route.route_number.clone(),
                    })
                    .returning(RouteRow::as_returning())
                    .get_result(tx)
                    .map_err(with_context("route", route_id, "update_route"))?;

                attach_children(tx, updated.id, &route)?;
                Ok(Route::from(updated))
            })
        })
        .await
    }

    async fn delete_route(&self, route_id: RouteId) -> RepositoryResult<RouteDeletion> {
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let id = route_id.value();
                // Children are counted explicitly; the FK cascade would otherwise hide them.
                let bus_stops_removed =
                    diesel::delete(bus_stops::table.filter(bus_stops::route_id.eq(id)))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                let stages_removed = diesel::delete(stages::table.filter(stages::route_id.eq(id)))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                let removed = diesel::delete(routes::table.find(id))
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                if removed == 0 {
                    return Err(RepositoryError::not_found_with_context(
                        format!("route {} not found", route_id),
                        ErrorContext::new("delete_route")
                            .with_entity("route")
                            .with_entity_id(route_id),
                    ));
                }

                Ok(RouteDeletion {
                    route_id,
                    bus_stops_removed,
                    stages_removed,
                })
            })
        })
        .await
    }
}

#[async_trait]
impl BusStopRepository for PostgresRepository {
    async fn get_bus_stop(&self, stop_id: BusStopId) -> RepositoryResult<BusStop> {
        self.with_conn(move |conn| {
            bus_stops::table
                .find(stop_id.value())
                .select(BusStopRow::as_select())
                .first::<BusStopRow>(conn)
                .map(BusStop::from)
                .map_err(with_context("bus_stop", stop_id, "get_bus_stop"))
        })
        .await
    }

    async fn list_bus_stops(&self) -> RepositoryResult<Vec<BusStop>> {
        self.with_conn(|conn| {
            let rows = bus_stops::table
                .select(BusStopRow::as_select())
                .order((bus_stops::stop_name.asc(), bus_stops::id.asc()))
                .load::<BusStopRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(BusStop::from).collect())
        })
        .await
    }

    async fn list_bus_stops_for_route(&self, route_id: RouteId) -> RepositoryResult<Vec<BusStop>> {
        self.with_conn(move |conn| {
            let rows = bus_stops::table
                .filter(bus_stops::route_id.eq(route_id.value()))
                .select(BusStopRow::as_select())
                .order((bus_stops::stop_name.asc(), bus_stops::id.asc()))
                .load::<BusStopRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(BusStop::from).collect())
        })
        .await
    }

    async fn insert_bus_stop(&self, stop: &NewBusStop) -> RepositoryResult<BusStop> {
        let changeset = BusStopChangeset::from(stop);
        self.with_conn(move |conn| {
            diesel::insert_into(bus_stops::table)
                .values(&changeset)
                .returning(BusStopRow::as_returning())
                .get_result::<BusStopRow>(conn)
                .map(BusStop::from)
                .map_err(|e| map_diesel_error(e).with_operation("insert_bus_stop"))
        })
        .await
    }

    async fn update_bus_stop(
        &self,
        stop_id: BusStopId,
        stop: &NewBusStop,
    ) -> RepositoryResult<BusStop> {
        let changeset = BusStopChangeset::from(stop);
        self.with_conn(move |conn| {
            diesel::update(bus_stops::table.find(stop_id.value()))
                .set(&changeset)
                .returning(BusStopRow::as_returning())
                .get_result::<BusStopRow>(conn)
                .map(BusStop::from)
                .map_err(with_context("bus_stop", stop_id, "update_bus_stop"))
        })
        .await
    }
}

#[async_trait]
impl StageRepository for PostgresRepository {
    async fn get_stage(&self, stage_id: StageId) -> RepositoryResult<Stage> {
        self.with_conn(move |conn| {
            stages::table
                .find(stage_id.value())
                .select(StageRow::as_select())
                .first::<StageRow>(conn)
                .map(Stage::from)
                .map_err(with_context("stage", stage_id, "get_stage"))
        })
        .await
    }

    async fn list_stages(&self) -> RepositoryResult<Vec<Stage>> {
        self.with_conn(|conn| {
            let rows = stages::table
                .select(StageRow::as_select())
                .order((stages::stage_name.asc(), stages::id.asc()))
                .load::<StageRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Stage::from).collect())
        })
        .await
    }

    async fn list_stages_for_route(&self, route_id: RouteId) -> RepositoryResult<Vec<Stage>> {
        self.with_conn(move |conn| {
            let rows = stages::table
                .filter(stages::route_id.eq(route_id.value()))
                .select(StageRow::as_select())
                .order((stages::stage_name.asc(), stages::id.asc()))
                .load::<StageRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Stage::from).collect())
        })
        .await
    }

    async fn insert_stage(&self, stage: &NewStage) -> RepositoryResult<Stage> {
        let changeset = StageChangeset::from(stage);
        self.with_conn(move |conn| {
            diesel::insert_into(stages::table)
                .values(&changeset)
                .returning(StageRow::as_returning())
                .get_result::<StageRow>(conn)
                .map(Stage::from)
                .map_err(|e| map_diesel_error(e).with_operation("insert_stage"))
        })
        .await
    }

    async fn update_stage(&self, stage_id: StageId, stage: &NewStage) -> RepositoryResult<Stage> {
        let changeset = StageChangeset::from(stage);
        self.with_conn(move |conn| {
            diesel::update(stages::table.find(stage_id.value()))
                .set(&changeset)
                .returning(StageRow::as_returning())
                .get_result::<StageRow>(conn)
                .map(Stage::from)
                .map_err(with_context("stage", stage_id, "update_stage"))
        })
        .await
    }
}
