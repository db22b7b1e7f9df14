//! Common test utilities for lost & found integration tests
//!
//! This file contains shared functions and utilities for all integration tests,
//! including test application setup, a scripted vision service, and helpers
//! for sending requests to the router.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use lostfound::{
    ai::{ImageData, VisionError, VisionService},
    create_app,
    db::init_pool,
    models::{ImageAnalysis, Item, MatchResult},
    run_migrations, AppSettings, AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::Service;

/// A 1x1 transparent PNG as a data URL
pub const PIXEL_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Vision service stand-in for integration tests
///
/// Photos are always described with `analysis`. A candidate is judged to
/// be the same object when its title equals the target's title, ignoring
/// case, and gets `confidence`; every other candidate gets 10.
pub struct TitleVision {
    pub analysis: Option<ImageAnalysis>,
    pub confidence: f64,
}

impl TitleVision {
    pub fn new(confidence: f64) -> Self {
        Self {
            analysis: Some(ImageAnalysis {
                tags: vec!["blue".to_string(), "bottle".to_string(), "metal".to_string()],
                enhanced_description: "A dented blue steel water bottle.".to_string(),
                category: "Accessories".to_string(),
            }),
            confidence,
        }
    }
}

#[async_trait]
impl VisionService for TitleVision {
    async fn analyze_image(&self, _image: &ImageData) -> Result<ImageAnalysis, VisionError> {
        self.analysis
            .clone()
            .ok_or_else(|| VisionError::Malformed("no analysis".to_string()))
    }

    async fn compare(&self, target: &Item, candidates: &[Item]) -> Result<Vec<MatchResult>, VisionError> {
        Ok(candidates
            .iter()
            .map(|candidate| {
                let same = candidate.get_title().eq_ignore_ascii_case(&target.get_title());
                MatchResult {
                    item_id: candidate.get_id(),
                    confidence: if same { self.confidence } else { 10.0 },
                    reason: if same { "Same object".to_string() } else { "Different object".to_string() },
                }
            })
            .collect())
    }
}

/// Creates application state around a fresh in-memory SQLite database
///
/// The database is a uniquely named shared-cache memory database, so all
/// pooled connections, including the background matcher's, see the same data.
pub fn create_test_state(vision: Arc<dyn VisionService>) -> AppState {
    let database_url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = Arc::new(init_pool(&database_url).unwrap());

    let conn = &mut pool.get().unwrap();
    run_migrations(conn).unwrap();

    AppState {
        pool,
        vision,
        settings: AppSettings::default(),
    }
}

/// Creates a test application whose AI matches reports with equal titles
pub fn create_test_app() -> Router {
    create_app(create_test_state(Arc::new(TitleVision::new(90.0))))
}

/// Sends a request and returns the status and the JSON body (Null when empty)
pub async fn send(app: &mut Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.call(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into()))
    };
    (status, value)
}

/// Sends a GET request
pub async fn get(app: &mut Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).method("GET").body(Body::empty()).unwrap();
    send(app, request).await
}

/// Sends a POST request with a JSON body
pub async fn post(app: &mut Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Sends a DELETE request
pub async fn delete(app: &mut Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).method("DELETE").body(Body::empty()).unwrap();
    send(app, request).await
}

/// Builds a complete report payload
pub fn report_payload(kind: &str, title: &str) -> Value {
    json!({
        "kind": kind,
        "title": title,
        "description": format!("{} reported in integration tests", title),
        "location": "Main quad",
        "contact_name": "Robin",
        "contact_info": "robin@campus.edu"
    })
}

/// Files a report via the API and returns the stored item
pub async fn report_item(app: &mut Router, kind: &str, title: &str) -> Item {
    let (status, body) = post(app, "/items", report_payload(kind, title)).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {}", body);
    serde_json::from_value(body).unwrap()
}

/// Polls `/notifications` until at least `count` are active or a second passes
pub async fn wait_for_notifications(app: &mut Router, count: usize) -> Vec<Value> {
    let mut notifications = Vec::new();
    for _ in 0..50 {
        let (_, body) = get(app, "/notifications").await;
        notifications = body.as_array().cloned().unwrap_or_default();
        if notifications.len() >= count {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    notifications
}
