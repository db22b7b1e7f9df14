use tracing::{info, instrument, warn};

use crate::ai::{ImageData, VisionService};
use crate::models::ImageAnalysis;

/// Describes a photo, falling back to generic values when that is not possible
///
/// Remote URLs cannot be sent inline, and service failures are logged
/// rather than returned, so report creation never fails because of the AI.
#[instrument(skip_all, fields(reference_len = reference.len()))]
pub async fn analyze_or_fallback(vision: &dyn VisionService, reference: &str) -> ImageAnalysis {
    let Some(image) = ImageData::from_reference(reference) else {
        warn!("Image cannot be sent inline, using fallback analysis");
        return ImageAnalysis::fallback();
    };

    match vision.analyze_image(&image).await {
        Ok(analysis) => {
            info!("Image analysed as {}", analysis.category);
            analysis
        }
        Err(err) => {
            warn!("Image analysis failed, using fallback: {}", err);
            ImageAnalysis::fallback()
        }
    }
}
