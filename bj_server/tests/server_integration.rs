//! Integration tests for the HTTP surface of the server.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bj_server::api::{AppState, create_router};
use blackjack_room::{RoomConfig, RoomHandle};
use http_body_util::BodyExt;
use tower::ServiceExt; // For `oneshot` method

fn test_app() -> (axum::Router, RoomHandle) {
    let room = RoomHandle::new(RoomConfig {
        dealer_key: Some("house".to_string()),
        ..Default::default()
    });
    (create_router(AppState::new(room.clone())), room)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = test_app();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["phase"], "idle");
    assert_eq!(json["players"], 0);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_check_reports_seated_players() {
    let (app, room) = test_app();
    room.join(&"c1".into(), "Alice", None).await.unwrap();
    room.join(&"c2".into(), "Bob", None).await.unwrap();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let json = body_json(app.oneshot(request).await.unwrap()).await;
    assert_eq!(json["players"], 2);
}

// ============================================================================
// Routing Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = test_app();

    let request = Request::builder()
        .uri("/tables")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_websocket_route_requires_upgrade() {
    let (app, _) = test_app();

    let request = Request::builder()
        .uri("/blackjack")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}
