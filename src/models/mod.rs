/// Data models module
///
/// This module defines the core data structures used throughout the application:
/// the persisted item reports and match notifications, plus the value types
/// exchanged with the AI service.

mod json_column;
pub use json_column::{MatchList, TagList};

mod kinds;
pub use kinds::{ItemKind, ItemStatus, NotificationKind};

mod item;
pub use item::{Item, ReportDetails};

mod match_result;
pub use match_result::{ImageAnalysis, MatchResult};

mod notification;
pub use notification::Notification;
