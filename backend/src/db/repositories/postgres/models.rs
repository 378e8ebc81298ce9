use diesel::prelude::*;

use super::schema::{bus_stops, routes, stages};
use crate::models::{BusStop, BusStopId, NewBusStop, NewStage, Route, RouteId, Stage, StageId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = routes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RouteRow {
    pub id: i64,
    pub route_number: String,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = routes)]
pub struct RouteChangeset {
    pub route_number: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bus_stops)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BusStopRow {
    pub id: i64,
    pub stop_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: i64,
}

/// Insert and full-replace payload for `bus_stops`.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = bus_stops)]
pub struct BusStopChangeset {
    pub stop_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: i64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = stages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StageRow {
    pub id: i64,
    pub stage_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: i64,
}

/// Insert and full-replace payload for `stages`.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = stages)]
pub struct StageChangeset {
    pub stage_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: i64,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route {
            id: RouteId(row.id),
            route_number: row.route_number,
        }
    }
}

impl From<BusStopRow> for BusStop {
    fn from(row: BusStopRow) -> Self {
        BusStop {
            id: BusStopId(row.id),
            stop_name: row.stop_name,
            lat: row.lat,
            lon: row.lon,
            route_id: RouteId(row.route_id),
        }
    }
}

impl From<StageRow> for Stage {
    fn from(row: StageRow) -> Self {
        Stage {
            id: StageId(row.id),
            stage_name: row.stage_name,
            lat: row.lat,
            lon: row.lon,
            route_id: RouteId(row.route_id),
        }
    }
}

impl From<&NewBusStop> for BusStopChangeset {
    fn from(stop: &NewBusStop) -> Self {
        BusStopChangeset {
            stop_name: stop.stop_name.clone(),
            lat: stop.lat,
            lon: stop.lon,
            route_id: stop.route_id.value(),
        }
    }
}

impl From<&NewStage> for StageChangeset {
    fn from(stage: &NewStage) -> Self {
        StageChangeset {
            stage_name: stage.stage_name.clone(),
            lat: stage.lat,
            lon: stage.lon,
            route_id: stage.route_id.value(),
        }
    }
}
