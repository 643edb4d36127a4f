//! Integration Tests for Admin API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use storefront_cache::{api::create_router, AppCache, AppState};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> (AppState, Router) {
    let state = AppState::new(AppCache::new());
    let app = create_router(state.clone());
    (state, app)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn put_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let (_, app) = create_test_app();

    let response = app
        .oneshot(put_json("/set", r#"{"key":"p:1","value":{"price":100}}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("p:1"));
    assert!(json["ttl"].is_null());
}

#[tokio::test]
async fn test_set_endpoint_with_preset() {
    let (state, app) = create_test_app();

    let response = app
        .oneshot(put_json(
            "/set",
            r#"{"key":"p:2","value":{"price":5},"preset":"products","tags":["sale"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ttl"], 300);
    assert_eq!(json["tags"], serde_json::json!(["products", "sale"]));
    assert_eq!(state.cache.invalidate_by_tags(["products"]).await, 1);
}

#[tokio::test]
async fn test_set_endpoint_rejects_empty_key() {
    let (_, app) = create_test_app();

    let response = app
        .oneshot(put_json("/set", r#"{"key":"","value":1}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_set_endpoint_rejects_zero_ttl() {
    let (_, app) = create_test_app();

    let response = app
        .oneshot(put_json("/set", r#"{"key":"k","value":1,"ttl":0}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_endpoint_rejects_huge_ttl() {
    let (state, app) = create_test_app();

    let response = app
        .oneshot(put_json(
            "/set",
            r#"{"key":"k","value":1,"ttl":18446744073709551615,"tags":["products"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.cache.is_empty().await);
    assert_eq!(state.cache.stats().await.tag_count, 0);
}

#[tokio::test]
async fn test_invalid_json_request() {
    let (_, app) = create_test_app();

    let response = app
        .oneshot(put_json("/set", "not json"))
        .await
        .unwrap();

    // Axum rejects malformed JSON bodies before the handler runs
    assert!(response.status().is_client_error());
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let (_, app) = create_test_app();

    app.clone()
        .oneshot(put_json("/set", r#"{"key":"c:1","value":["shoes","hats"]}"#))
        .await
        .unwrap();

    let response = app.oneshot(get("/get/c:1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "c:1");
    assert_eq!(json["value"][1], "hats");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let (_, app) = create_test_app();

    let response = app.oneshot(get("/get/missing")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success_then_not_found() {
    let (_, app) = create_test_app();

    app.clone()
        .oneshot(put_json("/set", r#"{"key":"p:1","value":1}"#))
        .await
        .unwrap();

    let response = app.clone().oneshot(delete("/del/p:1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(delete("/del/p:1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/get/p:1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == INVALIDATE Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_by_tags_endpoint() {
    let (_, app) = create_test_app();

    for body in [
        r#"{"key":"c:1","value":1,"tags":["categories","nav"]}"#,
        r#"{"key":"c:2","value":2,"tags":["categories"]}"#,
        r#"{"key":"s:1","value":3}"#,
    ] {
        app.clone().oneshot(put_json("/set", body)).await.unwrap();
    }

    let response = app
        .clone()
        .oneshot(post_json("/invalidate", r#"{"tags":["categories","ghost"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 2);

    let response = app.oneshot(get("/get/s:1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalidate_requires_tags() {
    let (_, app) = create_test_app();

    let response = app
        .oneshot(post_json("/invalidate", r#"{"tags":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == CLEAR / STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_and_clear_endpoints() {
    let (_, app) = create_test_app();

    app.clone()
        .oneshot(put_json("/set", r#"{"key":"p:1","value":1,"tags":["products"]}"#))
        .await
        .unwrap();
    app.clone().oneshot(get("/get/p:1")).await.unwrap(); // hit
    app.clone().oneshot(get("/get/p:2")).await.unwrap(); // miss

    let response = app.clone().oneshot(get("/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["tagged_entries"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["hit_rate"], 0.5);

    let response = app.clone().oneshot(delete("/clear")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["total_entries"], 0);
    assert_eq!(json["tag_count"], 0);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint_reports_background_tasks() {
    let (state, app) = create_test_app();
    state.cache.start();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["background_tasks"], true);

    state.cache.stop();
}
