use crate::db::{run_with_retry, DbPool};
use crate::models::Notification;
use crate::schema::notifications;
use anyhow::{Context, Result};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{instrument, debug, info};

/// Stores a new notification
#[instrument(skip(pool, notification), fields(notification_id = %notification.get_id(), target_item_id = %notification.get_target_item_id()))]
pub async fn create_notification(pool: &DbPool, notification: Notification) -> Result<Notification> {
    debug!("Creating notification");

    let mut conn = pool.get()?;

    run_with_retry(|| {
        diesel::insert_into(notifications::table)
            .values(&notification)
            .execute(&mut conn)
    })
    .await
    .context("Failed to create notification")?;

    info!("Successfully created notification with id: {}", notification.get_id());
    Ok(notification)
}

/// Retrieves a notification by its ID, dismissed or not
#[instrument(skip(pool), fields(notification_id = %notification_id))]
pub fn get_notification(pool: &DbPool, notification_id: &str) -> Result<Option<Notification>> {
    let conn = &mut pool.get()?;

    notifications::table
        .filter(notifications::id.eq(notification_id))
        .select(Notification::as_select())
        .first::<Notification>(conn)
        .optional()
        .context("Failed to get notification")
}

/// Lists notifications that have not been dismissed, newest first
#[instrument(skip(pool))]
pub fn list_active_notifications(pool: &DbPool) -> Result<Vec<Notification>> {
    let conn = &mut pool.get()?;

    let result = notifications::table
        .filter(notifications::dismissed_at.is_null())
        .order(notifications::created_at.desc())
        .select(Notification::as_select())
        .load::<Notification>(conn)
        .context("Failed to list notifications")?;

    debug!("Retrieved {} active notifications", result.len());
    Ok(result)
}

/// Hides a notification from the active list
///
/// Dismissing twice keeps the first dismissal time.
///
/// ### Errors
///
/// Returns an error if the notification does not exist or the update fails
#[instrument(skip(pool), fields(notification_id = %notification_id))]
pub async fn dismiss_notification(pool: &DbPool, notification_id: &str) -> Result<Notification> {
    let now = Utc::now().naive_utc();
    let mut conn = pool.get()?;

    run_with_retry(|| {
        diesel::update(
            notifications::table
                .find(notification_id)
                .filter(notifications::dismissed_at.is_null()),
        )
        .set(notifications::dismissed_at.eq(Some(now)))
        .execute(&mut conn)
    })
    .await
    .context("Failed to dismiss notification")?;

    drop(conn);

    get_notification(pool, notification_id)?
        .ok_or_else(|| anyhow::anyhow!("Notification with id {} not found", notification_id))
}
