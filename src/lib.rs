/// Lost & Found: a campus lost-and-found registry
///
/// This library provides the core functionality of the registry: reports of
/// lost and found items, AI photo tagging, and a matching engine that pairs
/// lost reports with found ones and records the probable matches as
/// notifications.
///
/// ### Modules
///
/// - `ai`: The vision service seam and its Gemini implementation
/// - `analysis`: Photo analysis with a generic fallback
/// - `config`: Layered configuration
/// - `db`: Database connection management
/// - `matching`: Candidate selection and match filtering
/// - `models`: Data structures representing reports and notifications
/// - `repo`: Repository layer for database operations
///
/// ### Web API
///
/// - `POST /items`: File a lost or found report
/// - `GET /items`: List reports, optionally filtered by kind, status and text
/// - `GET /items/{id}`: Get a specific report
/// - `DELETE /items/{id}`: Delete a report
/// - `POST /items/{id}/resolve`: Mark a report as resolved
/// - `POST /items/{id}/match`: Rescan a report for matches
/// - `POST /analysis`: Tag and describe a photo
/// - `GET /notifications`: List active match notifications
/// - `GET /notifications/{id}`: Get a specific notification
/// - `POST /notifications/{id}/dismiss`: Dismiss a notification

/// AI service module
pub mod ai;

/// Photo analysis with fallback
pub mod analysis;

/// Configuration module
pub mod config;

/// Database connection module
pub mod db;

/// Data transfer objects
pub mod dto;

/// API errors
pub mod errors;

/// HTTP handlers
pub mod handlers;

/// Matching engine
pub mod matching;

/// Data models module
pub mod models;

/// Repository module for database operations
pub mod repo;

/// Database schema module
pub mod schema;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::ai::{DisabledVision, GeminiClient, GeminiSettings, VisionService};
use crate::config::Config;
use crate::handlers::*;
use crate::matching::MatchSettings;

/// Headroom on top of the encoded image limit for the data URL prefix and the other fields
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

/// Largest request body accepted for a given decoded image limit
///
/// Photos arrive as base64 data URLs, which take four bytes for every three
/// decoded bytes.
fn body_limit_for(max_image_bytes: usize) -> usize {
    max_image_bytes.div_ceil(3) * 4 + BODY_LIMIT_HEADROOM
}

/// Runtime settings the handlers need
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppSettings {
    pub matching: MatchSettings,
    /// Largest accepted photo, in decoded bytes
    pub max_image_bytes: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            matching: MatchSettings::default(),
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

impl From<&Config> for AppSettings {
    fn from(config: &Config) -> Self {
        Self {
            matching: MatchSettings {
                confidence_threshold: config.match_confidence_threshold,
                candidate_limit: config.match_candidate_limit,
            },
            max_image_bytes: config.max_image_bytes,
        }
    }
}

/// Shared state of the HTTP server
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<db::DbPool>,
    pub vision: Arc<dyn VisionService>,
    pub settings: AppSettings,
}

impl FromRef<AppState> for Arc<db::DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl AppState {
    /// Builds the state from a configuration and an open pool
    ///
    /// Without an API key the AI features are disabled: photos get the
    /// fallback analysis and matching finds nothing.
    pub fn from_config(config: &Config, pool: Arc<db::DbPool>) -> Result<Self> {
        let vision: Arc<dyn VisionService> = match &config.gemini_api_key {
            Some(api_key) if !api_key.trim().is_empty() => {
                info!("AI features enabled with models {} / {}", config.tagging_model, config.matching_model);
                Arc::new(GeminiClient::new(GeminiSettings {
                    base_url: config.gemini_base_url.clone(),
                    api_key: api_key.clone(),
                    tagging_model: config.tagging_model.clone(),
                    matching_model: config.matching_model.clone(),
                    thinking_budget: config.thinking_budget,
                    request_timeout: config.request_timeout(),
                })?)
            }
            _ => {
                warn!("No Gemini API key configured, AI features are disabled");
                Arc::new(DisabledVision)
            }
        };

        Ok(Self {
            pool,
            vision,
            settings: AppSettings::from(config),
        })
    }
}

/// Creates the application router with all API routes
///
/// ### Arguments
///
/// * `state` - The shared application state
///
/// ### Returns
///
/// An Axum Router configured with all API routes
pub fn create_app(state: AppState) -> Router {
    let body_limit = body_limit_for(state.settings.max_image_bytes);

    Router::new()
        // Routes for filing and listing reports
        .route("/items", post(create_item_handler).get(list_items_handler))
        // Route for getting or deleting a specific report
        .route("/items/{id}", get(get_item_handler).delete(delete_item_handler))
        .route("/items/{id}/resolve", post(resolve_item_handler))
        .route("/items/{id}/match", post(match_item_handler))
        .route("/analysis", post(analyze_image_handler))
        .route("/notifications", get(list_notifications_handler))
        .route("/notifications/{id}", get(get_notification_handler))
        .route("/notifications/{id}/dismiss", post(dismiss_notification_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs all pending database migrations
pub fn run_migrations(conn: &mut diesel::SqliteConnection) -> Result<()> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("Failed to run migrations: {}", e))?;

    if !applied.is_empty() {
        info!("Applied {} migration(s)", applied.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;
    use crate::test_utils::{report, test_state, ScriptedVision, PIXEL_DATA_URL};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap() };
        (status, value)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).method("GET").body(Body::empty()).unwrap()
    }

    /// Tests that a report filed over HTTP is stored and returned
    #[tokio::test]
    async fn test_create_item_route() {
        let state = test_state(Arc::new(ScriptedVision::new()));
        let app = create_app(state.clone());

        let (status, item) = send(app, post_json("/items", json!({
            "kind": "LOST",
            "title": "Umbrella",
            "description": "Black umbrella with a wooden handle",
            "location": "Bus stop",
            "contact_name": "Kim",
            "contact_info": "kim@campus.edu"
        }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["title"], "Umbrella");
        assert_eq!(item["kind"], "LOST");
        assert_eq!(item["status"], "OPEN");
        assert!(item["id"].is_string());
    }

    /// Tests that blank required fields are rejected with a JSON error
    #[tokio::test]
    async fn test_create_item_route_rejects_blank_location() {
        let app = create_app(test_state(Arc::new(ScriptedVision::new())));

        let (status, body) = send(app, post_json("/items", json!({
            "kind": "FOUND",
            "description": "Keys",
            "location": " ",
            "contact_name": "Kim",
            "contact_info": "kim@campus.edu"
        }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "location must not be blank");
    }

    /// Tests the kind filter on the list route
    #[tokio::test]
    async fn test_list_items_route_with_filters() {
        let state = test_state(Arc::new(ScriptedVision::new()));
        repo::create_item(&state.pool, report(ItemKind::Lost, "Keys", &[])).await.unwrap();
        repo::create_item(&state.pool, report(ItemKind::Found, "Wallet", &[])).await.unwrap();
        let app = create_app(state);

        let (status, items) = send(app, get("/items?kind=FOUND&status=OPEN")).await;

        assert_eq!(status, StatusCode::OK);
        let items = items.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Wallet");
    }

    #[tokio::test]
    async fn test_get_missing_item_route_returns_null() {
        let app = create_app(test_state(Arc::new(ScriptedVision::new())));

        let (status, body) = send(app, get("/items/missing")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_resolve_missing_item_route_is_not_found() {
        let app = create_app(test_state(Arc::new(ScriptedVision::new())));

        let (status, body) = send(app, post_json("/items/missing/resolve", json!({}))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Item/Notification not found");
    }

    #[tokio::test]
    async fn test_analysis_route_falls_back_without_ai() {
        let app = create_app(test_state(Arc::new(ScriptedVision::new())));

        let (status, body) = send(app, post_json("/analysis", json!({ "image": PIXEL_DATA_URL }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tags"], json!(["Item"]));
        assert_eq!(body["category"], "General");
    }

    #[tokio::test]
    async fn test_body_limit_rejects_huge_payload() {
        let mut state = test_state(Arc::new(ScriptedVision::new()));
        state.settings.max_image_bytes = 16;
        let app = create_app(state);
        let image = "A".repeat(BODY_LIMIT_HEADROOM + 64);

        let response = app
            .oneshot(post_json("/analysis", json!({ "image": image })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    /// Tests that a photo of exactly the configured size fits through the body limit
    #[tokio::test]
    async fn test_image_at_size_limit_is_accepted_for_analysis() {
        let max = 2 * 1024 * 1024;
        let mut state = test_state(Arc::new(ScriptedVision::new()));
        state.settings.max_image_bytes = max;
        let app = create_app(state);
        let image = ai::ImageData::from_bytes("image/png", &vec![7u8; max]).to_data_url();

        let (status, body) = send(app, post_json("/analysis", json!({ "image": image }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "General");
    }

    #[tokio::test]
    async fn test_image_at_size_limit_is_accepted_for_new_item() {
        let max = 2 * 1024 * 1024;
        let mut state = test_state(Arc::new(ScriptedVision::new()));
        state.settings.max_image_bytes = max;
        let app = create_app(state);
        let image = ai::ImageData::from_bytes("image/png", &vec![7u8; max]).to_data_url();

        let (status, item) = send(app, post_json("/items", json!({
            "kind": "FOUND",
            "title": "Camera",
            "description": "Compact camera in a grey case",
            "location": "Library",
            "contact_name": "Kim",
            "contact_info": "kim@campus.edu",
            "image": image
        }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["title"], "Camera");
    }

    #[test]
    fn test_body_limit_covers_base64_expansion() {
        assert_eq!(body_limit_for(0), BODY_LIMIT_HEADROOM);
        assert_eq!(body_limit_for(3), 4 + BODY_LIMIT_HEADROOM);
        assert_eq!(body_limit_for(4), 8 + BODY_LIMIT_HEADROOM);
        assert!(body_limit_for(5 * 1024 * 1024) > 5 * 1024 * 1024 * 4 / 3);
    }

    /// Tests that list filters accept lower-case labels
    #[tokio::test]
    async fn test_list_items_route_filter_ignores_case() {
        let state = test_state(Arc::new(ScriptedVision::new()));
        repo::create_item(&state.pool, report(ItemKind::Lost, "Keys", &[])).await.unwrap();
        repo::create_item(&state.pool, report(ItemKind::Found, "Wallet", &[])).await.unwrap();
        let app = create_app(state);

        let (status, items) = send(app, get("/items?kind=lost&status=open")).await;

        assert_eq!(status, StatusCode::OK);
        let items = items.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Keys");
    }

    #[test]
    fn test_app_state_without_api_key_uses_disabled_vision() {
        let config = config::base_config(None);
        let pool = test_utils::setup_test_db();

        let state = AppState::from_config(&config, pool).unwrap();

        assert_eq!(state.settings.matching.confidence_threshold, 75.0);
        assert_eq!(state.settings.matching.candidate_limit, 3);
        assert_eq!(state.settings.max_image_bytes, 5 * 1024 * 1024);
    }
}
