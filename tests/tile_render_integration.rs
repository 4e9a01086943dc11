//! Integration tests for HTTP-backed tile rendering.
//!
//! Uses wiremock to stand in for the upstream data endpoint.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use futures::StreamExt;
use mosaic::config::MosaicConfig;
use tower::Service;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn body_string(response: axum::response::Response) -> String {
    let mut stream = response.into_body().into_data_stream();
    let mut result = String::new();
    while let Some(chunk) = stream.next().await {
        if let Ok(bytes) = chunk {
            result.push_str(&String::from_utf8_lossy(&bytes));
        }
    }
    result
}

fn http_config(server_url: &str) -> MosaicConfig {
    MosaicConfig {
        tiles: vec![make_tile_config("orders", "warehouse")],
        sources: vec![make_http_source(
            "warehouse",
            &format!("{}/rows", server_url),
        )],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_http_source_render() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"sku": "A-100", "qty": 3},
            {"sku": "B-200", "qty": 7},
        ])))
        .mount(&mock_server)
        .await;

    let (mut app, _state) = create_test_app_with(http_config(&mock_server.uri()));

    let request = Request::builder()
        .uri("/api/tiles/orders")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("A-100"));
    assert!(html.contains("B-200"));
}

#[tokio::test]
async fn test_http_source_forwards_query_params() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rows"))
        .and(query_param("region", "emea"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"sku": "A-100", "qty": 3},
        ])))
        .mount(&mock_server)
        .await;

    let (mut app, _state) = create_test_app_with(http_config(&mock_server.uri()));

    let request = Request::builder()
        .uri("/api/tiles/orders?region=emea")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    // An unmatched request would hit wiremock's default 404 and fail
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_http_source_upstream_error_maps_to_bad_gateway() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rows"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (mut app, state) = create_test_app_with(http_config(&mock_server.uri()));

    let request = Request::builder()
        .uri("/api/tiles/orders")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"]["code"], "bad_gateway");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("HTTP 500"));

    // The tile carries the failure
    let tile = state.registry.get_tile("orders").unwrap();
    assert_eq!(tile.status, mosaic::registry::TileStatus::Failed);
    assert!(tile.last_error.is_some());
}

#[tokio::test]
async fn test_http_source_decode_error_maps_to_bad_gateway() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rows"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let (mut app, _state) = create_test_app_with(http_config(&mock_server.uri()));

    let request = Request::builder()
        .uri("/api/tiles/orders")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_http_source_error_recorded_in_history() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rows"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let (mut app, state) = create_test_app_with(http_config(&mock_server.uri()));

    let request = Request::builder()
        .uri("/api/tiles/orders")
        .body(Body::empty())
        .unwrap();
    app.call(request).await.unwrap();

    let entries = state.history.recent(10);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, mosaic::history::RenderStatus::Error);
    assert!(entries[0].error_message.is_some());
}

#[tokio::test]
async fn test_http_source_recovers_after_upstream_heals() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rows"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"sku": "A-100", "qty": 3},
        ])))
        .mount(&mock_server)
        .await;

    let (mut app, state) = create_test_app_with(http_config(&mock_server.uri()));

    let first = Request::builder()
        .uri("/api/tiles/orders")
        .body(Body::empty())
        .unwrap();
    let response = app.call(first).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let second = Request::builder()
        .uri("/api/tiles/orders")
        .body(Body::empty())
        .unwrap();
    let response = app.call(second).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let tile = state.registry.get_tile("orders").unwrap();
    assert_eq!(tile.status, mosaic::registry::TileStatus::Ready);
    assert!(tile.last_error.is_none());
}
