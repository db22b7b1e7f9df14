use std::path::PathBuf;

use clap::Subcommand;
use lostfound::dto::{CreateItemDto, ItemQueryDto};
use lostfound::models::{ItemKind, ItemStatus};

use super::read_image_as_data_url;
use crate::client::LostFoundClient;
use crate::output::{self, OutputConfig};

/// Item management commands
#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// List reports, newest first
    List {
        /// Only LOST or FOUND reports
        #[clap(long)]
        kind: Option<ItemKind>,
        /// Only OPEN or RESOLVED reports
        #[clap(long)]
        status: Option<ItemStatus>,
        /// Text to look for in title, description, location and tags
        #[clap(long)]
        search: Option<String>,
    },
    /// Get a specific report by ID
    Get {
        /// The item ID
        id: String,
    },
    /// File a lost or found report
    Report {
        /// LOST or FOUND
        #[clap(long)]
        kind: ItemKind,
        /// Short name; derived from the photo when left out
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        description: String,
        /// Where the item was lost or found
        #[clap(long)]
        location: String,
        #[clap(long)]
        contact_name: String,
        /// Email address or phone number
        #[clap(long)]
        contact_info: String,
        /// Photo of the item
        #[clap(long)]
        image: Option<PathBuf>,
        /// Descriptive tag; repeat for several. Skips photo tagging
        #[clap(long = "tag")]
        tags: Vec<String>,
    },
    /// Mark a report as resolved
    Resolve {
        /// The item ID
        id: String,
    },
    /// Scan for matches now and wait for the result
    Match {
        /// The item ID
        id: String,
    },
    /// Delete a report
    Delete {
        /// The item ID
        id: String,
    },
}

/// Executes an item command
pub async fn execute(
    client: &LostFoundClient,
    cmd: ItemCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ItemCommands::List { kind, status, search } => {
            let items = client.list_items(&ItemQueryDto { kind, status, search }).await?;
            output::print_items(&items, config);
        }
        ItemCommands::Get { id } => {
            match client.get_item(&id).await? {
                Some(item) => output::print_item(&item, config),
                None => return Err(format!("Item not found: {}", id).into()),
            }
        }
        ItemCommands::Report {
            kind,
            title,
            description,
            location,
            contact_name,
            contact_info,
            image,
            tags,
        } => {
            let image = image.as_deref().map(read_image_as_data_url).transpose()?;
            let dto = CreateItemDto {
                kind,
                title,
                description,
                location,
                contact_name,
                contact_info,
                image,
                tags: if tags.is_empty() { None } else { Some(tags) },
                ai_description: None,
                category: None,
            };
            let item = client.create_item(&dto).await?;
            output::print_item(&item, config);
        }
        ItemCommands::Resolve { id } => {
            let item = client.resolve_item(&id).await?;
            output::print_item(&item, config);
        }
        ItemCommands::Match { id } => {
            let outcome = client.match_item(&id).await?;
            output::print_match_outcome(&outcome, config);
        }
        ItemCommands::Delete { id } => {
            client.delete_item(&id).await?;
            output::print_success(&format!("Deleted item {}", id), config);
        }
    }
    Ok(())
}
