//! HTTP routing tests driven through `tower::ServiceExt::oneshot`.

#![cfg(feature = "http-server")]

mod support;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use tembea_jiji::http::{create_router, AppState};

const BODY_LIMIT: usize = 1024 * 1024;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_connected_repository() {
    let fixture = support::nairobi_fixture().await;
    let app = create_router(AppState::new(fixture.shared()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_reports_unhealthy_repository() {
    let fixture = support::nairobi_fixture().await;
    fixture.repo.set_healthy(false);
    let app = create_router(AppState::new(fixture.shared()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["database"], "disconnected");
}

#[tokio::test]
async fn test_graphql_post_executes_query() {
    let fixture = support::nairobi_fixture().await;
    let app = create_router(AppState::new(fixture.shared()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "query": "{ stages { stageName } }" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "data": { "stages": [{ "stageName": "Odeon" }] } })
    );
}

#[tokio::test]
async fn test_graphql_post_mutation_round_trip() {
    let fixture = support::nairobi_fixture().await;
    let app = create_router(AppState::new(fixture.shared()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "query": "mutation($input: BusStopInput!) { createBusStop(input: $input) { ok stop { stopName } } }",
                "variables": {
                    "input": {
                        "stopName": "Railways",
                        "lat": -1.2905,
                        "lon": 36.8283,
                        "routeId": fixture.route_46.to_string()
                    }
                }
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        body_json(response).await["data"]["createBusStop"],
        json!({ "ok": true, "stop": { "stopName": "Railways" } })
    );
    assert_eq!(fixture.repo.bus_stop_count(), 3);
}

#[tokio::test]
async fn test_graphql_get_serves_graphiql() {
    let fixture = support::nairobi_fixture().await;
    let app = create_router(AppState::new(fixture.shared()));

    let response = app
        .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let fixture = support::nairobi_fixture().await;
    let app = create_router(AppState::new(fixture.shared()));

    let response = app
        .oneshot(Request::get("/v1/routes").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["message"], "No route for /v1/routes");
}
