use axum::{extract::State, Json};
use tracing::{instrument, info};

use crate::ai::validate_reference;
use crate::analysis::analyze_or_fallback;
use crate::dto::AnalyzeImageDto;
use crate::errors::ApiError;
use crate::models::ImageAnalysis;
use crate::AppState;

/// Handler for analysing a photo before a report is filed
///
/// This function handles POST requests to `/analysis`. It lets a client
/// prefill the report form; AI failures yield the generic fallback.
///
/// ### Errors
///
/// Returns `InvalidImage` when the photo is missing, not an image, or too large
#[instrument(skip(state, payload), fields(image_len = payload.image.len()))]
pub async fn analyze_image_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeImageDto>,
) -> Result<Json<ImageAnalysis>, ApiError> {
    let reference = payload.image.trim();
    if reference.is_empty() {
        return Err(ApiError::InvalidImage("image must not be empty".to_string()));
    }

    validate_reference(reference, state.settings.max_image_bytes)
        .map_err(|e| ApiError::InvalidImage(e.to_string()))?;

    let analysis = analyze_or_fallback(state.vision.as_ref(), reference).await;

    info!("Returning analysis with {} tags", analysis.tags.len());
    Ok(Json(analysis))
}
