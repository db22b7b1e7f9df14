/// AI service module
///
/// This module defines the seam between the application and the external
/// vision/reasoning service: image tagging for new reports and the
/// same-object comparison used by the matching engine.

mod gemini;
mod image;

pub use gemini::{GeminiClient, GeminiSettings};
pub use image::{ImageData, ImageError, validate_reference};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ImageAnalysis, Item, MatchResult};

/// Errors raised while talking to the AI service
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("AI service is not configured")]
    Disabled,
    #[error("AI request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("AI service returned {status}: {message}")]
    Upstream {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("AI response was malformed: {0}")]
    Malformed(String),
}

/// An external service able to describe photos and compare reports
#[async_trait]
pub trait VisionService: Send + Sync {
    /// Generates tags, a one-sentence description and a category for a photo
    async fn analyze_image(&self, image: &ImageData) -> Result<ImageAnalysis, VisionError>;

    /// Judges which of `candidates` show the same physical object as `target`
    ///
    /// Returns every judgement the service made, whatever its confidence.
    async fn compare(&self, target: &Item, candidates: &[Item]) -> Result<Vec<MatchResult>, VisionError>;
}

/// Stand-in used when no API key is configured; every call fails
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledVision;

#[async_trait]
impl VisionService for DisabledVision {
    async fn analyze_image(&self, _image: &ImageData) -> Result<ImageAnalysis, VisionError> {
        Err(VisionError::Disabled)
    }

    async fn compare(&self, _target: &Item, _candidates: &[Item]) -> Result<Vec<MatchResult>, VisionError> {
        Err(VisionError::Disabled)
    }
}
