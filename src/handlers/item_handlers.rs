use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::ai::validate_reference;
use crate::analysis::analyze_or_fallback;
use crate::db::DbPool;
use crate::dto::{CreateItemDto, ItemQueryDto};
use crate::errors::ApiError;
use crate::matching::{run_matching, spawn_matching, MatchOutcome, MatchTrigger};
use crate::models::{ImageAnalysis, Item, ReportDetails};
use crate::{repo, AppState};

/// Handler for filing a new lost or found report
///
/// This function handles POST requests to `/items`.
///
/// A photo without tags is analysed first, and the generated tags,
/// description and category are stored with the report. Matching against
/// the opposite kind then runs in the background, so the response does not
/// wait for the AI.
///
/// ### Arguments
///
/// * `state` - The application state
/// * `payload` - The report to file
///
/// ### Returns
///
/// The newly created item as JSON
///
/// ### Errors
///
/// Returns `InvalidReport` for blank required fields and `InvalidImage` for
/// photos that are not images or exceed the size limit
#[instrument(skip(state, payload), fields(kind = %payload.kind, has_image = payload.image.is_some()))]
pub async fn create_item_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemDto>,
) -> Result<Json<Item>, ApiError> {
    info!("Filing new report");

    payload.validate().map_err(ApiError::InvalidReport)?;

    let image = payload.image_reference().map(str::to_string);
    if let Some(reference) = image.as_deref() {
        validate_reference(reference, state.settings.max_image_bytes)
            .map_err(|e| ApiError::InvalidImage(e.to_string()))?;
    }

    let analysis: Option<ImageAnalysis> = match (image.as_deref(), &payload.tags) {
        (Some(reference), None) => Some(analyze_or_fallback(state.vision.as_ref(), reference).await),
        _ => None,
    };

    let category = payload
        .category
        .clone()
        .or_else(|| analysis.as_ref().map(|a| a.category.clone()));
    let title = payload.resolve_title(category.as_deref());

    let (tags, ai_description) = match analysis {
        Some(analysis) => (analysis.tags, Some(analysis.enhanced_description)),
        None => (payload.tags.clone().unwrap_or_default(), payload.ai_description.clone()),
    };

    let item = Item::new(payload.kind, ReportDetails {
        title,
        description: payload.description.trim().to_string(),
        location: payload.location.trim().to_string(),
        contact_name: payload.contact_name.trim().to_string(),
        contact_info: payload.contact_info.trim().to_string(),
        image_url: image,
        tags,
        ai_description,
        category,
    });

    let item = repo::create_item(&state.pool, item).await
        .map_err(ApiError::Database)?;

    spawn_matching(state.clone(), item.clone());

    info!("Successfully filed report with id: {}", item.get_id());
    Ok(Json(item))
}

/// Handler for listing reports
///
/// This function handles GET requests to `/items`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `query` - Optional `kind`, `status` and `search` filters
///
/// ### Returns
///
/// The matching items as JSON, newest first
#[instrument(skip(pool))]
pub async fn list_items_handler(
    State(pool): State<Arc<DbPool>>,
    Query(query): Query<ItemQueryDto>,
) -> Result<Json<Vec<Item>>, ApiError> {
    debug!("Listing items");

    let items = repo::list_items(&pool, &query)
        .map_err(ApiError::Database)?;

    info!("Retrieved {} items", items.len());
    Ok(Json(items))
}

/// Handler for retrieving a specific item
///
/// This function handles GET requests to `/items/{id}`.
///
/// ### Returns
///
/// The requested item as JSON, or null if not found
#[instrument(skip(pool), fields(item_id = %item_id))]
pub async fn get_item_handler(
    State(pool): State<Arc<DbPool>>,
    Path(item_id): Path<String>,
) -> Result<Json<Option<Item>>, ApiError> {
    debug!("Retrieving item");

    let item = repo::get_item(&pool, &item_id)
        .map_err(ApiError::Database)?;

    if item.is_none() {
        debug!("Item not found");
    }

    Ok(Json(item))
}

/// Handler for deleting a specific item
///
/// This function handles DELETE requests to `/items/{id}`. Notifications
/// about the item are deleted with it.
#[instrument(skip(pool), fields(item_id = %item_id))]
pub async fn delete_item_handler(
    State(pool): State<Arc<DbPool>>,
    Path(item_id): Path<String>,
) -> Result<Json<()>, ApiError> {
    info!("Deleting item with id: {}", item_id);

    // First check if the item exists
    repo::get_item(&pool, &item_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    repo::delete_item(&pool, &item_id).await
        .map_err(ApiError::Database)?;

    info!("Successfully deleted item with id: {}", item_id);
    Ok(Json(()))
}

/// Handler for marking an item as returned to its owner
///
/// This function handles POST requests to `/items/{id}/resolve`.
/// Resolved items no longer take part in matching.
///
/// ### Returns
///
/// The updated item as JSON
#[instrument(skip(pool), fields(item_id = %item_id))]
pub async fn resolve_item_handler(
    State(pool): State<Arc<DbPool>>,
    Path(item_id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    info!("Resolving item");

    repo::get_item(&pool, &item_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let item = repo::resolve_item(&pool, &item_id).await
        .map_err(ApiError::Database)?;

    Ok(Json(item))
}

/// Handler for rescanning an item against the current reports
///
/// This function handles POST requests to `/items/{id}/match` and waits
/// for the comparison to finish.
///
/// ### Returns
///
/// The number of matches and the notification recorded for them
#[instrument(skip(state), fields(item_id = %item_id))]
pub async fn match_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<MatchOutcome>, ApiError> {
    info!("Running manual match scan");

    let item = repo::get_item(&state.pool, &item_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let outcome = run_matching(&state, &item, MatchTrigger::ManualScan).await
        .map_err(ApiError::Database)?;

    info!("Manual scan found {} match(es)", outcome.match_count);
    Ok(Json(outcome))
}
