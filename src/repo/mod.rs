/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains functions for storing, querying and updating item reports
/// and match notifications.
///
/// The repository pattern abstracts away the details of database access
/// and provides a clean API for the rest of the application to use.

mod item_repo;
mod notification_repo;

// Re-export all repository functions
pub use item_repo::*;
pub use notification_repo::*;
