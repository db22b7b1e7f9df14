use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Item, MatchList, MatchResult, NotificationKind};

/// An in-app notice listing probable matches for a report
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Notification {
    id: String,
    kind: NotificationKind,
    message: String,

    /// The report the matches were found for
    target_item_id: String,
    target_item_title: String,

    matches: MatchList,
    created_at: NaiveDateTime,

    /// Set once the user has dismissed the notification
    dismissed_at: Option<NaiveDateTime>,
}

impl Notification {
    /// Creates a match notification for `target`
    ///
    /// ### Arguments
    ///
    /// * `target` - The report the matches belong to
    /// * `message` - The user-facing text
    /// * `matches` - The probable matches, best first
    pub fn match_found(target: &Item, message: String, matches: Vec<MatchResult>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: NotificationKind::MatchFound,
            message,
            target_item_id: target.get_id(),
            target_item_title: target.get_title(),
            matches: MatchList(matches),
            created_at: Utc::now().naive_utc(),
            dismissed_at: None,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn get_message(&self) -> String {
        self.message.clone()
    }

    pub fn get_target_item_id(&self) -> String {
        self.target_item_id.clone()
    }

    pub fn get_target_item_title(&self) -> String {
        self.target_item_title.clone()
    }

    pub fn get_matches(&self) -> &[MatchResult] {
        &self.matches.0
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    pub fn get_dismissed_at(&self) -> Option<DateTime<Utc>> {
        self.dismissed_at
            .map(|dismissed_at| DateTime::from_naive_utc_and_offset(dismissed_at, Utc))
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed_at.is_some()
    }
}
