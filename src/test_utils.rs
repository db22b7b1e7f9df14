use crate::*;
use crate::ai::{ImageData, VisionError, VisionService};
use crate::models::{ImageAnalysis, Item, ItemKind, ItemStatus, MatchResult, ReportDetails};
use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A 1x1 transparent PNG as a data URL
pub const PIXEL_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Sets up a test database with migrations applied
///
/// Uses a unique shared-cache in-memory database, so every connection in
/// the pool sees the same schema while tests stay isolated from each other.
///
/// ### Returns
///
/// An Arc-wrapped database connection pool connected to the in-memory database
pub fn setup_test_db() -> Arc<db::DbPool> {
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url).expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn).expect("Failed to run migrations");
    drop(conn);

    Arc::new(pool)
}

/// Builds an application state around a test database and a vision fake
pub fn test_state(vision: Arc<ScriptedVision>) -> AppState {
    AppState {
        pool: setup_test_db(),
        vision,
        settings: AppSettings::default(),
    }
}

/// Builds the content of a report with the given title and tags
pub fn report_details(title: &str, tags: &[&str]) -> ReportDetails {
    ReportDetails {
        title: title.to_string(),
        description: "Reported in tests".to_string(),
        location: "Student Union".to_string(),
        contact_name: "Alex".to_string(),
        contact_info: "alex@campus.edu".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

/// Builds an open report with the given kind, title and tags
pub fn report(kind: ItemKind, title: &str, tags: &[&str]) -> Item {
    Item::new(kind, report_details(title, tags))
}

/// Builds an open report carrying a photo
pub fn report_with_image(kind: ItemKind, title: &str, tags: &[&str], image_url: &str) -> Item {
    Item::new(kind, ReportDetails {
        image_url: Some(image_url.to_string()),
        ..report_details(title, tags)
    })
}

/// Shorthand for a match judgement
pub fn judgement(item: &Item, confidence: f64) -> MatchResult {
    MatchResult {
        item_id: item.get_id(),
        confidence,
        reason: format!("scripted at {}", confidence),
    }
}

/// A `VisionService` that replays canned answers and records its calls
///
/// Unscripted operations fail, which exercises the fallback paths.
#[derive(Default)]
pub struct ScriptedVision {
    analysis: Option<ImageAnalysis>,
    matches: Option<Vec<MatchResult>>,
    analyze_calls: AtomicUsize,
    compared: Mutex<Vec<Vec<String>>>,
}

impl ScriptedVision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_analysis(mut self, analysis: ImageAnalysis) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn with_matches(mut self, matches: Vec<MatchResult>) -> Self {
        self.matches = Some(matches);
        self
    }

    pub fn analyze_count(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    /// Candidate IDs sent with each compare call, in call order
    pub fn compared_ids(&self) -> Vec<Vec<String>> {
        self.compared.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionService for ScriptedVision {
    async fn analyze_image(&self, _image: &ImageData) -> Result<ImageAnalysis, VisionError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.analysis
            .clone()
            .ok_or_else(|| VisionError::Malformed("no scripted analysis".to_string()))
    }

    async fn compare(&self, _target: &Item, candidates: &[Item]) -> Result<Vec<MatchResult>, VisionError> {
        self.compared
            .lock()
            .unwrap()
            .push(candidates.iter().map(|c| c.get_id()).collect());
        self.matches
            .clone()
            .ok_or_else(|| VisionError::Malformed("no scripted matches".to_string()))
    }
}

/// Generates an arbitrary item kind
pub fn arb_kind() -> impl Strategy<Value = ItemKind> {
    prop_oneof![Just(ItemKind::Lost), Just(ItemKind::Found)]
}

/// Generates an arbitrary item status
pub fn arb_status() -> impl Strategy<Value = ItemStatus> {
    prop_oneof![Just(ItemStatus::Open), Just(ItemStatus::Resolved)]
}

/// Generates a tag list drawn from a small vocabulary so overlaps are common
pub fn arb_tags() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(vec!["blue", "black", "leather", "metal", "phone", "keys", "bag", "scarf"]),
        0..6,
    )
    .prop_map(|tags| tags.into_iter().map(str::to_string).collect())
}

/// Generates a report with arbitrary kind, status and tags
pub fn arb_item() -> impl Strategy<Value = Item> {
    (arb_kind(), arb_status(), arb_tags()).prop_map(|(kind, status, tags)| {
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        report(kind, "Arbitrary", &tags).with_status(status)
    })
}
