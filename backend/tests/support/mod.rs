#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tembea_jiji::db::repository::{
    BusStopRepository, FullRepository, RouteRepository, StageRepository,
};
use tembea_jiji::db::LocalRepository;
use tembea_jiji::models::{BusStopId, NewBusStop, NewRoute, NewStage, RouteId, StageId};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process-global environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// A small Nairobi network: route "46" with two stops and a stage, and an
/// empty route "111".
pub struct Fixture {
    pub repo: Arc<LocalRepository>,
    pub route_46: RouteId,
    pub route_111: RouteId,
    pub kencom: BusStopId,
    pub ngara: BusStopId,
    pub odeon: StageId,
}

impl Fixture {
    pub fn shared(&self) -> Arc<dyn FullRepository> {
        self.repo.clone()
    }

    pub async fn add_stop(&self, name: &str, route_id: RouteId) -> BusStopId {
        self.repo
            .insert_bus_stop(&NewBusStop {
                stop_name: name.to_string(),
                lat: -1.2833,
                lon: 36.8167,
                route_id,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn add_stage(&self, name: &str, route_id: RouteId) -> StageId {
        self.repo
            .insert_stage(&NewStage {
                stage_name: name.to_string(),
                lat: -1.2833,
                lon: 36.8167,
                route_id,
            })
            .await
            .unwrap()
            .id
    }
}

pub async fn nairobi_fixture() -> Fixture {
    let repo = Arc::new(LocalRepository::new());

    let route_46 = repo
        .insert_route(&NewRoute {
            route_number: "46".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .id;
    let route_111 = repo
        .insert_route(&NewRoute {
            route_number: "111".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .id;

    let kencom = repo
        .insert_bus_stop(&NewBusStop {
            stop_name: "Kencom".to_string(),
            lat: -1.2864,
            lon: 36.8252,
            route_id: route_46,
        })
        .await
        .unwrap()
        .id;
    let ngara = repo
        .insert_bus_stop(&NewBusStop {
            stop_name: "Ngara".to_string(),
            lat: -1.2741,
            lon: 36.8233,
            route_id: route_46,
        })
        .await
        .unwrap()
        .id;
    let odeon = repo
        .insert_stage(&NewStage {
            stage_name: "Odeon".to_string(),
            lat: -1.2830,
            lon: 36.8262,
            route_id: route_46,
        })
        .await
        .unwrap()
        .id;

    Fixture {
        repo,
        route_46,
        route_111,
        kencom,
        ngara,
        odeon,
    }
}
