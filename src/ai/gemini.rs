use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::{ImageData, VisionError, VisionService};
use crate::models::{ImageAnalysis, Item, MatchResult};

const ANALYSIS_INSTRUCTION: &str = "Describe this lost-and-found item. Reply with a JSON object \
containing 'tags' (five descriptive strings), 'enhancedDescription' (one detailed sentence about \
its physical appearance) and 'category' (a broad category such as Electronics or Clothing).";

const MATCH_INSTRUCTION: &str = "You are an expert in forensic visual comparison. Decide whether \
each candidate below is the same physical object as the target item, weighing visual details, \
wear and tear, and the written descriptions. Give every candidate a confidence from 0 to 100 and \
a short reason, identifying it by its ID.";

/// Connection and model settings for the Gemini REST API
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// API root, e.g. `https://generativelanguage.googleapis.com`
    pub base_url: String,
    pub api_key: String,
    /// Model used to tag and describe photos
    pub tagging_model: String,
    /// Model used to compare a report with its candidates
    pub matching_model: String,
    /// Thinking tokens granted to the matching model
    pub thinking_budget: u32,
    pub request_timeout: Duration,
}

/// `VisionService` backed by the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    settings: GeminiSettings,
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: ImageData,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize, Debug)]
struct ResponseCandidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

impl GenerateContentResponse {
    /// Concatenates the answer text of the first candidate, skipping thoughts
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    tags: Vec<String>,
    enhanced_description: String,
    category: String,
}

#[derive(Deserialize, Debug)]
struct RawMatches {
    matches: Vec<RawMatch>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    item_id: String,
    confidence: f64,
    reason: String,
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "tags": { "type": "ARRAY", "items": { "type": "STRING" } },
            "enhancedDescription": { "type": "STRING" },
            "category": { "type": "STRING" }
        },
        "required": ["tags", "enhancedDescription", "category"]
    })
}

fn matches_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "matches": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "itemId": { "type": "STRING" },
                        "confidence": { "type": "NUMBER" },
                        "reason": { "type": "STRING" }
                    },
                    "required": ["itemId", "confidence", "reason"]
                }
            }
        },
        "required": ["matches"]
    })
}

/// Extension trait turning error statuses into `VisionError::Upstream`
trait ResponseExt {
    async fn check(self) -> Result<reqwest::Response, VisionError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, VisionError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        // Google wraps failures as {"error": {"code", "message", "status"}}
        let message = match self.json::<Value>().await {
            Ok(body) => body
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
            Err(_) => format!("HTTP {}", status),
        };
        Err(VisionError::Upstream { status, message })
    }
}

/// Builds the text block describing one report in a comparison request
fn describe(label: &str, item: &Item) -> String {
    format!(
        "\n{}:\nTitle: {}\nDescription: {}",
        label,
        item.get_title(),
        item.get_description()
    )
}

/// Appends the item's photo to `parts` when it can be inlined
fn push_image(parts: &mut Vec<Part>, item: &Item) {
    if let Some(image) = item.get_image_url().as_deref().and_then(ImageData::from_reference) {
        parts.push(Part::InlineData { inline_data: image });
    }
}

impl GeminiClient {
    /// Creates a client with the request timeout from `settings`
    pub fn new(settings: GeminiSettings) -> Result<Self, VisionError> {
        let client = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self { client, settings })
    }

    /// Sends one `generateContent` request and returns the answer text
    ///
    /// Returns `Ok(None)` when the model produced no answer text.
    #[instrument(skip(self, parts, schema), fields(part_count = parts.len()))]
    async fn generate(
        &self,
        model: &str,
        parts: Vec<Part>,
        schema: Value,
        thinking_budget: Option<u32>,
    ) -> Result<Option<String>, VisionError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        );
        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
                thinking_config: thinking_budget.map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
        };

        debug!("Sending generateContent request");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&request)
            .send()
            .await?
            .check()
            .await?;

        let body: GenerateContentResponse = response.json().await?;
        Ok(body.text())
    }
}

#[async_trait]
impl VisionService for GeminiClient {
    #[instrument(skip(self, image), fields(mime_type = %image.mime_type))]
    async fn analyze_image(&self, image: &ImageData) -> Result<ImageAnalysis, VisionError> {
        let parts = vec![
            Part::InlineData { inline_data: image.clone() },
            Part::Text { text: ANALYSIS_INSTRUCTION.to_string() },
        ];

        let text = self
            .generate(&self.settings.tagging_model, parts, analysis_schema(), None)
            .await?
            .ok_or_else(|| VisionError::Malformed("analysis response contained no text".to_string()))?;

        let raw: RawAnalysis =
            serde_json::from_str(&text).map_err(|e| VisionError::Malformed(e.to_string()))?;

        info!("Image analysed into {} tags, category {}", raw.tags.len(), raw.category);
        Ok(ImageAnalysis {
            tags: raw.tags,
            enhanced_description: raw.enhanced_description,
            category: raw.category,
        })
    }

    #[instrument(skip(self, target, candidates), fields(target_id = %target.get_id(), candidate_count = candidates.len()))]
    async fn compare(&self, target: &Item, candidates: &[Item]) -> Result<Vec<MatchResult>, VisionError> {
        let mut parts = vec![
            Part::Text { text: MATCH_INSTRUCTION.to_string() },
            Part::Text { text: describe("TARGET_ITEM", target) },
        ];
        push_image(&mut parts, target);

        for (i, candidate) in candidates.iter().enumerate() {
            let label = format!("CANDIDATE_{} (ID: {})", i, candidate.get_id());
            parts.push(Part::Text { text: describe(&label, candidate) });
            push_image(&mut parts, candidate);
        }

        let text = self
            .generate(
                &self.settings.matching_model,
                parts,
                matches_schema(),
                Some(self.settings.thinking_budget),
            )
            .await?;

        // An empty answer means the model found nothing to report
        let Some(text) = text else {
            return Ok(Vec::new());
        };

        let raw: RawMatches =
            serde_json::from_str(&text).map_err(|e| VisionError::Malformed(e.to_string()))?;

        info!("Model returned {} judgements", raw.matches.len());
        Ok(raw
            .matches
            .into_iter()
            .map(|m| MatchResult {
                item_id: m.item_id,
                confidence: m.confidence,
                reason: m.reason,
            })
            .collect())
    }
}
