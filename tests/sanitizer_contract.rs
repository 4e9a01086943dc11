//! Contract tests for the sanitizer gate.
//!
//! Every fragment the server emits has passed through the sanitizer, so the
//! properties checked here hold for arbitrary source data, including rows
//! that smuggle markup through the `html:` column convention.

mod common;

use axum::body::Body;
use axum::http::Request;
use common::*;
use futures::StreamExt;
use mosaic::config::{MosaicConfig, SanitizerConfig, SourceConfig, SourceKind};
use mosaic::sanitize::Sanitizer;
use proptest::prelude::*;
use tower::Service;

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

/// Config whose fixture rows carry hostile values.
fn hostile_config(rows: serde_json::Value) -> MosaicConfig {
    MosaicConfig {
        tiles: vec![make_tile_config("report", "fixture")],
        sources: vec![SourceConfig {
            name: "fixture".to_string(),
            kind: SourceKind::Static,
            url: None,
            rows: Some(rows),
            pool_size: 2,
        }],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_rendered_fragment_escapes_cell_markup() {
    let (mut app, _state) = create_test_app_with(hostile_config(serde_json::json!([
        {"name": "<script>alert(1)</script>", "value": "a & b"},
    ])));

    let request = Request::builder()
        .uri("/api/tiles/report")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    let html = body_string(response).await;

    assert!(!html.contains("<script"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("a &amp; b"));
}

#[tokio::test]
async fn test_html_column_passes_allowed_markup() {
    let (mut app, _state) = create_test_app_with(hostile_config(serde_json::json!([
        {"region": "emea", "html:trend": "<strong>up</strong>"},
    ])));

    let request = Request::builder()
        .uri("/api/tiles/report")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    let html = body_string(response).await;

    assert!(html.contains("<strong>up</strong>"));
}

#[tokio::test]
async fn test_html_column_still_gated() {
    let (mut app, _state) = create_test_app_with(hostile_config(serde_json::json!([
        {"region": "emea", "html:trend": "<img src=x onerror=alert(1)>"},
    ])));

    let request = Request::builder()
        .uri("/api/tiles/report")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    let html = body_string(response).await;

    assert!(!html.contains("onerror"));
}

#[tokio::test]
async fn test_extra_tags_config_extends_allow_list() {
    let config = MosaicConfig {
        sanitizer: SanitizerConfig {
            extra_tags: vec!["mark".to_string()],
            ..Default::default()
        },
        ..hostile_config(serde_json::json!([
            {"region": "emea", "html:note": "<mark>hot</mark>"},
        ]))
    };
    let (mut app, _state) = create_test_app_with(config);

    let request = Request::builder()
        .uri("/api/tiles/report")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    let html = body_string(response).await;

    assert!(html.contains("<mark>hot</mark>"));
}

proptest! {
    /// No input, however mangled, yields an executable script element.
    #[test]
    fn prop_output_never_contains_script(input in ".{0,200}") {
        let sanitizer = Sanitizer::new(&SanitizerConfig::default());
        let out = sanitizer.sanitize(&input);
        prop_assert!(!out.html.to_lowercase().contains("<script"));
    }

    /// Event handler attributes never survive, regardless of casing or
    /// surrounding junk.
    #[test]
    fn prop_output_never_contains_event_handlers(
        tag in "div|span|td|a",
        handler in "onclick|onload|onerror|onmouseover",
        payload in "[a-z()';]{0,30}",
    ) {
        let sanitizer = Sanitizer::new(&SanitizerConfig::default());
        let input = format!(r#"<{} {}="{}">x</{}>"#, tag, handler, payload, tag);
        let out = sanitizer.sanitize(&input);
        prop_assert!(!out.html.contains("on"), "handler survived: {}", out.html);
    }

    /// Sanitizing clean output again changes nothing and removes nothing.
    #[test]
    fn prop_sanitize_idempotent(input in ".{0,200}") {
        let sanitizer = Sanitizer::new(&SanitizerConfig::default());
        let once = sanitizer.sanitize(&input);
        let twice = sanitizer.sanitize(&once.html);
        prop_assert_eq!(&once.html, &twice.html);
        prop_assert_eq!(twice.removals, 0);
    }

    /// Every open tag the sanitizer emits gets closed.
    #[test]
    fn prop_output_balanced(input in "(<[a-z]{1,6}>|text|</[a-z]{1,6}>){0,20}") {
        let sanitizer = Sanitizer::new(&SanitizerConfig::default());
        let out = sanitizer.sanitize(&input);
        let opens = out.html.matches("<div>").count();
        let closes = out.html.matches("</div>").count();
        prop_assert_eq!(opens, closes);
    }
}
