use super::repositories::LocalRepository;
use super::repository::{BusStopRepository, RouteRepository, StageRepository};
use super::services::*;
use crate::models::{BusStopId, NewBusStop, NewRoute, NewStage, RouteId, StageId};

async fn seed_route(repo: &LocalRepository, number: &str) -> RouteId {
    repo.insert_route(&NewRoute {
        route_number: number.to_string(),
        ..Default::default()
    })
    .await
    .unwrap()
    .id
}

async fn seed_stop(repo: &LocalRepository, name: &str, route_id: RouteId) -> BusStopId {
    repo.insert_bus_stop(&NewBusStop {
        stop_name: name.to_string(),
        lat: -1.2921,
        lon: 36.8219,
        route_id,
    })
    .await
    .unwrap()
    .id
}

async fn seed_stage(repo: &LocalRepository, name: &str, route_id: RouteId) -> StageId {
    repo.insert_stage(&NewStage {
        stage_name: name.to_string(),
        lat: -1.3001,
        lon: 36.7800,
        route_id,
    })
    .await
    .unwrap()
    .id
}

fn stop_fields(name: &str, route_id: Option<RouteId>) -> BusStopFields {
    BusStopFields {
        stop_name: name.to_string(),
        lat: -1.2833,
        lon: 36.8167,
        route_id,
    }
}

#[tokio::test]
async fn test_create_bus_stop_with_owner_echoes_fields() {
    let repo = LocalRepository::new();
    let route_id = seed_route(&repo, "46").await;

    let outcome = create_bus_stop(&repo, stop_fields("Kencom", Some(route_id)))
        .await
        .unwrap();

    assert!(outcome.ok);
    let stop = outcome.record.unwrap();
    assert_eq!(stop.stop_name, "Kencom");
    assert_eq!(stop.lat, -1.2833);
    assert_eq!(stop.lon, 36.8167);
    assert_eq!(stop.route_id, route_id);
    assert_eq!(repo.bus_stop_count(), 1);
}

#[tokio::test]
async fn test_create_bus_stop_without_valid_owner_fails() {
    let repo = LocalRepository::new();

    let missing = create_bus_stop(&repo, stop_fields("Kencom", None)).await.unwrap();
    assert_eq!(missing, MutationOutcome::failure());

    let unknown = create_bus_stop(&repo, stop_fields("Kencom", Some(RouteId::new(99))))
        .await
        .unwrap();
    assert!(!unknown.ok);
    assert!(unknown.record.is_none());
    assert_eq!(repo.bus_stop_count(), 0);
}

#[tokio::test]
async fn test_create_route_with_unknown_stop_writes_nothing() {
    let repo = LocalRepository::new();
    let home = seed_route(&repo, "9").await;
    let stop = seed_stop(&repo, "Ngara", home).await;

    let outcome = create_route(
        &repo,
        RouteFields {
            route_number: "46".to_string(),
            stop_ids: vec![Some(stop), Some(BusStopId::new(404))],
            stage_ids: vec![],
        },
    )
    .await
    .unwrap();

    assert!(!outcome.ok);
    assert!(outcome.record.is_none());
    assert_eq!(repo.route_count(), 1);
    assert_eq!(repo.get_bus_stop(stop).await.unwrap().route_id, home);
}

#[tokio::test]
async fn test_create_route_with_unparsable_reference_fails() {
    let repo = LocalRepository::new();

    let outcome = create_route(
        &repo,
        RouteFields {
            route_number: "46".to_string(),
            stop_ids: vec![],
            stage_ids: vec![None],
        },
    )
    .await
    .unwrap();

    assert!(!outcome.ok);
    assert_eq!(repo.route_count(), 0);
}

#[tokio::test]
async fn test_create_route_attaches_exactly_the_given_children() {
    let repo = LocalRepository::new();
    let home = seed_route(&repo, "9").await;
    let s1 = seed_stop(&repo, "Ngara", home).await;
    let s2 = seed_stop(&repo, "Kencom", home).await;
    let untouched = seed_stop(&repo, "Westlands", home).await;
    let g1 = seed_stage(&repo, "Odeon", home).await;

    let outcome = create_route(
        &repo,
        RouteFields {
            route_number: "46".to_string(),
            stop_ids: vec![Some(s1), Some(s2)],
            stage_ids: vec![Some(g1)],
        },
    )
    .await
    .unwrap();

    assert!(outcome.ok);
    let route = outcome.record.unwrap();
    assert_eq!(repo.route_count(), 2);

    let mut stops: Vec<BusStopId> = list_bus_stops_for_route(&repo, route.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    stops.sort();
    assert_eq!(stops, vec![s1, s2]);

    let stages = list_stages_for_route(&repo, route.id).await.unwrap();
    assert_eq!(stages.len(), 1);
    assert_eq!(stages[0].id, g1);

    assert_eq!(repo.get_bus_stop(untouched).await.unwrap().route_id, home);
}

#[tokio::test]
async fn test_update_missing_bus_stop_fails_without_write() {
    let repo = LocalRepository::new();
    let route_id = seed_route(&repo, "46").await;
    let stop = seed_stop(&repo, "Kencom", route_id).await;

    let outcome = update_bus_stop(&repo, BusStopId::new(77), stop_fields("Moved", None))
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert!(outcome.record.is_none());
    assert_eq!(repo.bus_stop_count(), 1);
    assert_eq!(repo.get_bus_stop(stop).await.unwrap().stop_name, "Kencom");
}

#[tokio::test]
async fn test_update_bus_stop_keeps_or_changes_owner() {
    let repo = LocalRepository::new();
    let r1 = seed_route(&repo, "46").await;
    let r2 = seed_route(&repo, "111").await;
    let stop = seed_stop(&repo, "Kencom", r1).await;

    let kept = update_bus_stop(&repo, stop, stop_fields("Kencom Stage", None))
        .await
        .unwrap();
    assert!(kept.ok);
    let kept = kept.record.unwrap();
    assert_eq!(kept.stop_name, "Kencom Stage");
    assert_eq!(kept.route_id, r1);

    let moved = update_bus_stop(&repo, stop, stop_fields("Kencom Stage", Some(r2)))
        .await
        .unwrap();
    assert_eq!(moved.record.unwrap().route_id, r2);

    let rejected = update_bus_stop(&repo, stop, stop_fields("Nowhere", Some(RouteId::new(50))))
        .await
        .unwrap();
    assert!(!rejected.ok);
    assert_eq!(repo.get_bus_stop(stop).await.unwrap().stop_name, "Kencom Stage");
}

#[tokio::test]
async fn test_update_stage_overwrites_fields() {
    let repo = LocalRepository::new();
    let route_id = seed_route(&repo, "46").await;
    let stage = seed_stage(&repo, "Odeon", route_id).await;

    let outcome = update_stage(
        &repo,
        stage,
        StageFields {
            stage_name: "Ambassadeur".to_string(),
            lat: -1.2855,
            lon: 36.8262,
            route_id: None,
        },
    )
    .await
    .unwrap();

    assert!(outcome.ok);
    let updated = outcome.record.unwrap();
    assert_eq!(updated.stage_name, "Ambassadeur");
    assert_eq!(updated.lat, -1.2855);
    assert_eq!(updated.route_id, route_id);
}

#[tokio::test]
async fn test_update_route_replaces_name_and_children() {
    let repo = LocalRepository::new();
    let spare = seed_route(&repo, "9").await;
    let s1 = seed_stop(&repo, "Ngara", spare).await;
    let s2 = seed_stop(&repo, "Kencom", spare).await;
    let g1 = seed_stage(&repo, "Odeon", spare).await;

    let route = create_route(
        &repo,
        RouteFields {
            route_number: "46".to_string(),
            stop_ids: vec![Some(s1)],
            stage_ids: vec![],
        },
    )
    .await
    .unwrap()
    .record
    .unwrap();

    let outcome = update_route(
        &repo,
        route.id,
        RouteFields {
            route_number: "46X".to_string(),
            stop_ids: vec![Some(s1), Some(s2)],
            stage_ids: vec![Some(g1)],
        },
    )
    .await
    .unwrap();

    assert!(outcome.ok);
    let reread = get_route(&repo, Some(route.id)).await.unwrap().unwrap();
    assert_eq!(reread.route_number, "46X");

    let mut stops: Vec<BusStopId> = list_bus_stops_for_route(&repo, route.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    stops.sort();
    assert_eq!(stops, vec![s1, s2]);
    assert_eq!(list_stages_for_route(&repo, route.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_route_rejects_orphaning_a_child() {
    let repo = LocalRepository::new();
    let route_id = seed_route(&repo, "46").await;
    let owned = seed_stop(&repo, "Kencom", route_id).await;

    let outcome = update_route(
        &repo,
        route_id,
        RouteFields {
            route_number: "46X".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(!outcome.ok);
    assert_eq!(repo.get_route(route_id).await.unwrap().route_number, "46");
    assert_eq!(repo.get_bus_stop(owned).await.unwrap().route_id, route_id);
}

#[tokio::test]
async fn test_update_unknown_route_fails() {
    let repo = LocalRepository::new();

    let outcome = update_route(&repo, RouteId::new(3), RouteFields::default())
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::failure());
    assert_eq!(repo.route_count(), 0);
}

#[tokio::test]
async fn test_list_routes_ordered_by_number() {
    let repo = LocalRepository::new();
    for number in ["58", "111", "23", "46"] {
        seed_route(&repo, number).await;
    }

    let numbers: Vec<String> = list_routes(&repo)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.route_number)
        .collect();
    assert_eq!(numbers, vec!["111", "23", "46", "58"]);
}

#[tokio::test]
async fn test_delete_route_removes_children() {
    let repo = LocalRepository::new();
    let doomed = seed_route(&repo, "46").await;
    let kept = seed_route(&repo, "111").await;
    seed_stop(&repo, "Kencom", doomed).await;
    seed_stage(&repo, "Odeon", doomed).await;
    seed_stop(&repo, "Ngara", kept).await;

    let deletion = delete_route(&repo, doomed).await.unwrap().unwrap();
    assert_eq!(deletion.bus_stops_removed, 1);
    assert_eq!(deletion.stages_removed, 1);

    assert!(list_bus_stops(&repo)
        .await
        .unwrap()
        .iter()
        .all(|s| s.route_id == kept));
    assert!(list_stages(&repo).await.unwrap().is_empty());
    assert!(delete_route(&repo, doomed).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_with_omitted_id_is_none_and_unknown_id_errors() {
    let repo = LocalRepository::new();

    assert!(get_route(&repo, None).await.unwrap().is_none());
    assert!(get_bus_stop(&repo, None).await.unwrap().is_none());
    assert!(get_stage(&repo, None).await.unwrap().is_none());

    let err = get_route(&repo, Some(RouteId::new(8))).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_infrastructure_errors_propagate() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);

    let result = create_bus_stop(&repo, stop_fields("Kencom", Some(RouteId::new(1)))).await;
    assert!(result.is_err());
    assert!(!health_check(&repo).await.unwrap());
}
