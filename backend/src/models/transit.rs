//! Transit records: routes and the stops and stages they own.
//!
//! Every [`BusStop`] and [`Stage`] belongs to exactly one [`Route`]; removing
//! a route removes its children with it.

use serde::{Deserialize, Serialize};

crate::define_id_type!(i64, RouteId);
crate::define_id_type!(i64, BusStopId);
crate::define_id_type!(i64, StageId);

/// A named transit line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    /// Short display name such as `"46"` or `"111X"`.
    pub route_number: String,
}

/// A geolocated boarding point owned by one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusStop {
    pub id: BusStopId,
    pub stop_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: RouteId,
}

/// A named waypoint along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub stage_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: RouteId,
}

/// Route write payload. Child ids are attached to the route on write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewRoute {
    pub route_number: String,
    pub stop_ids: Vec<BusStopId>,
    pub stage_ids: Vec<StageId>,
}

/// Bus stop write payload used for both inserts and full replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBusStop {
    pub stop_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: RouteId,
}

impl NewBusStop {
    pub(crate) fn into_record(self, id: BusStopId) -> BusStop {
        BusStop {
            id,
            stop_name: self.stop_name,
            lat: self.lat,
            lon: self.lon,
            route_id: self.route_id,
        }
    }
}

/// Stage write payload used for both inserts and full replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStage {
    pub stage_name: String,
    pub lat: f64,
    pub lon: f64,
    pub route_id: RouteId,
}

impl NewStage {
    pub(crate) fn into_record(self, id: StageId) -> Stage {
        Stage {
            id,
            stage_name: self.stage_name,
            lat: self.lat,
            lon: self.lon,
            route_id: self.route_id,
        }
    }
}

/// Summary of a cascading route deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDeletion {
    pub route_id: RouteId,
    pub bus_stops_removed: usize,
    pub stages_removed: usize,
}
