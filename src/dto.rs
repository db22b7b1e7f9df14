use serde::{Deserialize, Serialize};

use crate::models::{ItemKind, ItemStatus};

/// Title given to reports filed without a title or an AI category
pub const UNKNOWN_ITEM_TITLE: &str = "Unknown Item";

/// Data transfer object for filing a new report
///
/// This struct is used to deserialize JSON requests for creating items.
/// The AI fields are normally left out and filled in from the photo; a
/// client that already ran `/analysis` may send them along.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateItemDto {
    /// Whether the item was lost or found
    pub kind: ItemKind,

    /// Short name of the item; derived from the photo when blank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub description: String,
    pub location: String,
    pub contact_name: String,
    pub contact_info: String,

    /// Data URL, bare base64 payload, or remote URL of a photo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Tags from an earlier analysis; when present the photo is not re-analysed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl CreateItemDto {
    /// Checks that every required text field has content
    ///
    /// ### Errors
    ///
    /// Returns a message naming the first blank field
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("description", &self.description),
            ("location", &self.location),
            ("contact_name", &self.contact_name),
            ("contact_info", &self.contact_info),
        ];

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(format!("{} must not be blank", field)),
            None => Ok(()),
        }
    }

    /// Picks the title to store: the trimmed title, else `category`, else a placeholder
    pub fn resolve_title(&self, category: Option<&str>) -> String {
        [self.title.as_deref(), category]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
            .unwrap_or(UNKNOWN_ITEM_TITLE)
            .to_string()
    }

    /// Returns the photo reference, ignoring blank strings
    pub fn image_reference(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.trim().is_empty())
    }
}

/// Data transfer object for listing items
///
/// All filters are optional; an empty query lists every report.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ItemQueryDto {
    pub kind: Option<ItemKind>,
    pub status: Option<ItemStatus>,

    /// Case-insensitive text matched against title, description, location and tags
    pub search: Option<String>,
}

/// Data transfer object for analysing a photo without filing a report
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnalyzeImageDto {
    /// Data URL or bare base64 payload of the photo
    pub image: String,
}
