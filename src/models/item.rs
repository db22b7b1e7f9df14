use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ItemKind, ItemStatus, TagList};

/// Represents a lost or found item report
///
/// This struct maps directly to the `items` table in the database.
/// Reports are created `OPEN` and move to `RESOLVED` once the owner and the
/// item have been reunited.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Item {
    /// Unique identifier for the item (UUID v4 as string)
    id: String,

    /// Whether the item was lost or found
    kind: ItemKind,

    title: String,
    description: String,

    /// Where the item was lost or found
    location: String,

    contact_name: String,
    contact_info: String,

    /// Data URL, bare base64 payload, or remote URL of the photo
    image_url: Option<String>,

    /// Descriptive tags, used to prefilter match candidates
    tags: TagList,

    /// One-sentence physical description generated from the photo
    ai_description: Option<String>,

    /// Broad category generated from the photo
    category: Option<String>,

    /// When the report was filed
    reported_at: NaiveDateTime,

    status: ItemStatus,

    /// When the report was last changed
    updated_at: NaiveDateTime,
}

/// The user-supplied and AI-generated content of a new report
#[derive(Debug, Clone, Default)]
pub struct ReportDetails {
    pub title: String,
    pub description: String,
    pub location: String,
    pub contact_name: String,
    pub contact_info: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub ai_description: Option<String>,
    pub category: Option<String>,
}

impl Item {
    /// Creates a new open report
    ///
    /// This method generates a UUID v4 for the ID and sets both the
    /// `reported_at` and `updated_at` timestamps to the current time.
    ///
    /// ### Arguments
    ///
    /// * `kind` - Whether the item was lost or found
    /// * `details` - The content of the report
    ///
    /// ### Returns
    ///
    /// A new `Item` with status `OPEN`
    pub fn new(kind: ItemKind, details: ReportDetails) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: details.title,
            description: details.description,
            location: details.location,
            contact_name: details.contact_name,
            contact_info: details.contact_info,
            image_url: details.image_url,
            tags: TagList(details.tags),
            ai_description: details.ai_description,
            category: details.category,
            reported_at: now,
            status: ItemStatus::Open,
            updated_at: now,
        }
    }

    /// Overrides the report timestamp, keeping `updated_at` in step
    pub fn with_reported_at(mut self, reported_at: DateTime<Utc>) -> Self {
        self.reported_at = reported_at.naive_utc();
        self.updated_at = self.reported_at;
        self
    }

    /// Overrides the status
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_kind(&self) -> ItemKind {
        self.kind
    }

    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    pub fn get_description(&self) -> String {
        self.description.clone()
    }

    pub fn get_location(&self) -> String {
        self.location.clone()
    }

    pub fn get_contact_name(&self) -> String {
        self.contact_name.clone()
    }

    pub fn get_contact_info(&self) -> String {
        self.contact_info.clone()
    }

    pub fn get_image_url(&self) -> Option<String> {
        self.image_url.clone()
    }

    /// Borrows the item's tags
    pub fn get_tags(&self) -> &[String] {
        &self.tags.0
    }

    pub fn get_ai_description(&self) -> Option<String> {
        self.ai_description.clone()
    }

    pub fn get_category(&self) -> Option<String> {
        self.category.clone()
    }

    pub fn get_status(&self) -> ItemStatus {
        self.status
    }

    /// Returns true while the report still takes part in matching
    pub fn is_open(&self) -> bool {
        self.status == ItemStatus::Open
    }

    /// Gets the report timestamp as a DateTime<Utc>
    pub fn get_reported_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.reported_at, Utc)
    }

    /// Gets the last-update timestamp as a DateTime<Utc>
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }

    /// Counts this item's tags that also appear in `other`'s tags
    ///
    /// Comparison is exact. A tag repeated on this item counts once per
    /// occurrence.
    pub fn tag_overlap(&self, other: &Item) -> usize {
        self.get_tags()
            .iter()
            .filter(|tag| other.get_tags().contains(tag))
            .count()
    }

    /// Case-insensitive search over title, description, location and tags
    ///
    /// An empty term matches every item.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self.location.to_lowercase().contains(&term)
            || self.get_tags().iter().any(|tag| tag.to_lowercase().contains(&term))
    }
}
