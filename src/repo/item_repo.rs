use crate::db::{run_with_retry, DbPool};
use crate::dto::ItemQueryDto;
use crate::models::{Item, ItemKind, ItemStatus};
use crate::schema::items;
use anyhow::{Context, Result};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{instrument, debug, info};

/// Stores a new item report
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `new_item` - The report to insert
///
/// ### Returns
///
/// A Result containing the stored Item if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database insert operation fails
#[instrument(skip(pool, new_item), fields(item_id = %new_item.get_id(), kind = %new_item.get_kind()))]
pub async fn create_item(pool: &DbPool, new_item: Item) -> Result<Item> {
    debug!("Creating new item");

    let mut conn = pool.get()?;

    run_with_retry(|| {
        diesel::insert_into(items::table)
            .values(&new_item)
            .execute(&mut conn)
    })
    .await
    .context("Failed to create item")?;

    info!("Successfully created item with id: {}", new_item.get_id());

    Ok(new_item)
}

/// Retrieves an item from the database by its ID
///
/// ### Returns
///
/// A Result containing an Option with the Item if found, or None if not found
#[instrument(skip(pool), fields(item_id = %item_id))]
pub fn get_item(pool: &DbPool, item_id: &str) -> Result<Option<Item>> {
    debug!("Retrieving item by id");

    let conn = &mut pool.get()?;

    let result = items::table
        .filter(items::id.eq(item_id))
        .select(Item::as_select())
        .first::<Item>(conn)
        .optional()
        .context("Failed to get item")?;

    if result.is_none() {
        debug!("Item not found");
    }

    Ok(result)
}

/// Lists items matching a query, newest first
///
/// Kind and status are filtered in SQL. The free-text search runs over
/// title, description, location and tags, ignoring case.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `query` - The filters to apply; an empty query lists everything
#[instrument(skip(pool))]
pub fn list_items(pool: &DbPool, query: &ItemQueryDto) -> Result<Vec<Item>> {
    debug!("Listing items");

    let conn = &mut pool.get()?;

    let mut sql = items::table
        .select(Item::as_select())
        .order(items::reported_at.desc())
        .into_boxed();

    if let Some(kind) = query.kind {
        sql = sql.filter(items::kind.eq(kind));
    }
    if let Some(status) = query.status {
        sql = sql.filter(items::status.eq(status));
    }

    let mut result = sql.load::<Item>(conn).context("Failed to list items")?;

    if let Some(term) = query.search.as_deref() {
        result.retain(|item| item.matches_search(term));
    }

    info!("Retrieved {} items", result.len());
    Ok(result)
}

/// Lists the open reports of one kind, newest first
#[instrument(skip(pool))]
pub fn list_open_items_of_kind(pool: &DbPool, kind: ItemKind) -> Result<Vec<Item>> {
    list_items(pool, &ItemQueryDto {
        kind: Some(kind),
        status: Some(ItemStatus::Open),
        search: None,
    })
}

/// Marks an item as resolved
///
/// Resolving an already resolved item only bumps `updated_at`.
///
/// ### Errors
///
/// Returns an error if the item does not exist or the update fails
#[instrument(skip(pool), fields(item_id = %item_id))]
pub async fn resolve_item(pool: &DbPool, item_id: &str) -> Result<Item> {
    debug!("Resolving item");

    let now = Utc::now().naive_utc();
    let mut conn = pool.get()?;

    let updated = run_with_retry(|| {
        diesel::update(items::table.find(item_id))
            .set((items::status.eq(ItemStatus::Resolved), items::updated_at.eq(now)))
            .execute(&mut conn)
    })
    .await
    .context("Failed to resolve item")?;

    drop(conn);

    if updated == 0 {
        anyhow::bail!("Item with id {} not found", item_id);
    }

    get_item(pool, item_id)?
        .ok_or_else(|| anyhow::anyhow!("Item with id {} not found after update", item_id))
}

/// Deletes an item and, through the foreign key, its notifications
#[instrument(skip(pool), fields(item_id = %item_id))]
pub async fn delete_item(pool: &DbPool, item_id: &str) -> Result<()> {
    debug!("Deleting item by id");

    let mut conn = pool.get()?;

    run_with_retry(|| diesel::delete(items::table.find(item_id)).execute(&mut conn))
        .await
        .context("Failed to delete item")?;

    debug!("Successfully deleted item with id: {}", item_id);
    Ok(())
}
