use serde::{Deserialize, Serialize};

/// A probable match between a report and one of its candidates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// ID of the candidate item judged to be the same object
    pub item_id: String,
    /// Confidence on a 0-100 scale
    pub confidence: f64,
    /// Short justification given by the reasoning model
    pub reason: String,
}

/// Tags and descriptions generated from an item photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub tags: Vec<String>,
    pub enhanced_description: String,
    /// Broad category such as Electronics or Clothing
    pub category: String,
}

impl ImageAnalysis {
    /// The analysis recorded when the AI service cannot describe an image
    pub fn fallback() -> Self {
        Self {
            tags: vec!["Item".to_string()],
            enhanced_description: "Registry entry created.".to_string(),
            category: "General".to_string(),
        }
    }
}
