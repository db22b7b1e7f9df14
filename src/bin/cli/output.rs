use clap::ValueEnum;
use lostfound::matching::MatchOutcome;
use lostfound::models::{ImageAnalysis, Item, MatchResult, Notification};
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs or counts)
    pub quiet: bool,
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("Failed to render JSON: {}", err),
    }
}

/// Shortens `text` to at most `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// One line per match: candidate ID, confidence and reason
fn format_match(m: &MatchResult) -> String {
    format!("{}  {:>5.1}%  {}", m.item_id, m.confidence, m.reason)
}

/// Prints a list of items in the specified format
pub fn print_items(items: &[Item], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if items.is_empty() {
                if !config.quiet {
                    println!("No items found.");
                }
                return;
            }
            if config.quiet {
                for item in items {
                    println!("{}", item.get_id());
                }
                return;
            }
            let max_id = items.iter().map(|i| i.get_id().len()).max().unwrap_or(2);
            let max_title = items
                .iter()
                .map(|i| i.get_title().chars().count().min(32))
                .max()
                .unwrap_or(5)
                .max(5);
            println!(
                "{:<id_w$}  {:<5}  {:<8}  {:<title_w$}  LOCATION",
                "ID",
                "KIND",
                "STATUS",
                "TITLE",
                id_w = max_id,
                title_w = max_title,
            );
            for item in items {
                println!(
                    "{:<id_w$}  {:<5}  {:<8}  {:<title_w$}  {}",
                    item.get_id(),
                    item.get_kind(),
                    item.get_status(),
                    truncate(&item.get_title(), 32),
                    item.get_location(),
                    id_w = max_id,
                    title_w = max_title,
                );
            }
        }
        OutputFormat::Json => print_json(items),
    }
}

/// Prints a single item in the specified format
pub fn print_item(item: &Item, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", item.get_id());
                return;
            }
            println!("ID:          {}", item.get_id());
            println!("Kind:        {}", item.get_kind());
            println!("Status:      {}", item.get_status());
            println!("Title:       {}", item.get_title());
            println!("Description: {}", item.get_description());
            println!("Location:    {}", item.get_location());
            println!("Contact:     {} ({})", item.get_contact_name(), item.get_contact_info());
            if let Some(category) = item.get_category() {
                println!("Category:    {}", category);
            }
            if !item.get_tags().is_empty() {
                println!("Tags:        {}", item.get_tags().join(", "));
            }
            if let Some(ai_description) = item.get_ai_description() {
                println!("AI summary:  {}", ai_description);
            }
            println!("Photo:       {}", if item.get_image_url().is_some() { "yes" } else { "no" });
            println!("Reported:    {}", item.get_reported_at());
            println!("Updated:     {}", item.get_updated_at());
        }
        OutputFormat::Json => print_json(item),
    }
}

/// Prints a list of notifications in the specified format
pub fn print_notifications(notifications: &[Notification], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if notifications.is_empty() {
                if !config.quiet {
                    println!("No notifications.");
                }
                return;
            }
            for notification in notifications {
                if config.quiet {
                    println!("{}", notification.get_id());
                    continue;
                }
                println!(
                    "{}  {}  {}",
                    notification.get_id(),
                    notification.get_created_at().format("%Y-%m-%d %H:%M"),
                    notification.get_message()
                );
            }
        }
        OutputFormat::Json => print_json(notifications),
    }
}

/// Prints a single notification with its matches
pub fn print_notification(notification: &Notification, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", notification.get_id());
                return;
            }
            println!("ID:       {}", notification.get_id());
            println!("Message:  {}", notification.get_message());
            println!("Item:     {} ({})", notification.get_target_item_title(), notification.get_target_item_id());
            println!("Created:  {}", notification.get_created_at());
            if let Some(dismissed_at) = notification.get_dismissed_at() {
                println!("Dismissed: {}", dismissed_at);
            }
            println!("Matches:");
            for m in notification.get_matches() {
                println!("  {}", format_match(m));
            }
        }
        OutputFormat::Json => print_json(notification),
    }
}

/// Prints the result of a manual match scan
pub fn print_match_outcome(outcome: &MatchOutcome, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", outcome.match_count);
                return;
            }
            match &outcome.notification {
                Some(notification) => print_notification(notification, config),
                None => println!("No probable matches found."),
            }
        }
        OutputFormat::Json => print_json(outcome),
    }
}

/// Prints the tags, description and category generated for a photo
pub fn print_analysis(analysis: &ImageAnalysis, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", analysis.category);
                return;
            }
            println!("Category:    {}", analysis.category);
            println!("Tags:        {}", analysis.tags.join(", "));
            println!("Description: {}", analysis.enhanced_description);
        }
        OutputFormat::Json => print_json(analysis),
    }
}

/// Prints a success message in the specified format
pub fn print_success(message: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if !config.quiet {
                println!("{}", message);
            }
        }
        OutputFormat::Json => {
            print_json(&serde_json::json!({"status": "ok", "message": message}));
        }
    }
}
