use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::Notification;
use crate::repo;

/// Handler for listing notifications that have not been dismissed
///
/// This function handles GET requests to `/notifications`.
#[instrument(skip(pool))]
pub async fn list_notifications_handler(
    State(pool): State<Arc<DbPool>>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = repo::list_active_notifications(&pool)
        .map_err(ApiError::Database)?;

    debug!("Retrieved {} active notifications", notifications.len());
    Ok(Json(notifications))
}

/// Handler for retrieving a specific notification
///
/// This function handles GET requests to `/notifications/{id}`.
///
/// ### Returns
///
/// The notification as JSON, or null if not found
#[instrument(skip(pool), fields(notification_id = %notification_id))]
pub async fn get_notification_handler(
    State(pool): State<Arc<DbPool>>,
    Path(notification_id): Path<String>,
) -> Result<Json<Option<Notification>>, ApiError> {
    let notification = repo::get_notification(&pool, &notification_id)
        .map_err(ApiError::Database)?;

    Ok(Json(notification))
}

/// Handler for dismissing a notification
///
/// This function handles POST requests to `/notifications/{id}/dismiss`.
///
/// ### Returns
///
/// The dismissed notification as JSON
#[instrument(skip(pool), fields(notification_id = %notification_id))]
pub async fn dismiss_notification_handler(
    State(pool): State<Arc<DbPool>>,
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    info!("Dismissing notification");

    repo::get_notification(&pool, &notification_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let notification = repo::dismiss_notification(&pool, &notification_id).await
        .map_err(ApiError::Database)?;

    Ok(Json(notification))
}
