//! Postgres backend tests. Skipped unless `DATABASE_URL` points at a
//! disposable database.

#![cfg(feature = "postgres-repo")]

use tembea_jiji::db::repository::{BusStopRepository, RouteRepository, StageRepository};
use tembea_jiji::db::{PostgresConfig, PostgresRepository};
use tembea_jiji::models::{NewBusStop, NewRoute, NewStage};

fn repository() -> Option<PostgresRepository> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(PostgresRepository::new(PostgresConfig::with_url(url)).expect("connect to DATABASE_URL"))
}

#[tokio::test]
async fn test_route_lifecycle_against_postgres() {
    let Some(repo) = repository() else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    assert!(repo.health_check().await.unwrap());

    let home = repo
        .insert_route(&NewRoute {
            route_number: "pg-home".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let stop = repo
        .insert_bus_stop(&NewBusStop {
            stop_name: "Kencom".to_string(),
            lat: -1.2864,
            lon: 36.8252,
            route_id: home.id,
        })
        .await
        .unwrap();
    let stage = repo
        .insert_stage(&NewStage {
            stage_name: "Odeon".to_string(),
            lat: -1.2830,
            lon: 36.8262,
            route_id: home.id,
        })
        .await
        .unwrap();

    let route = repo
        .insert_route(&NewRoute {
            route_number: "pg-46".to_string(),
            stop_ids: vec![stop.id],
            stage_ids: vec![stage.id],
        })
        .await
        .unwrap();

    assert_eq!(repo.get_bus_stop(stop.id).await.unwrap().route_id, route.id);
    assert_eq!(repo.list_stages_for_route(route.id).await.unwrap().len(), 1);
    assert!(repo.list_bus_stops_for_route(home.id).await.unwrap().is_empty());

    let deletion = repo.delete_route(route.id).await.unwrap();
    assert_eq!(deletion.bus_stops_removed, 1);
    assert_eq!(deletion.stages_removed, 1);
    assert!(repo.get_bus_stop(stop.id).await.unwrap_err().is_not_found());

    repo.delete_route(home.id).await.unwrap();
    assert!(repo.get_route(home.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_dangling_route_reference_is_validation_error() {
    let Some(repo) = repository() else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let err = repo
        .insert_stage(&NewStage {
            stage_name: "Nowhere".to_string(),
            lat: 0.0,
            lon: 0.0,
            route_id: i64::MAX.into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        tembea_jiji::db::RepositoryError::ValidationError { .. }
    ));
}
