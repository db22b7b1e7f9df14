use clap::Subcommand;

use crate::client::LostFoundClient;
use crate::output::{self, OutputConfig};

/// Match notification commands
#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// List notifications that have not been dismissed
    List,
    /// Show a notification and its matches
    Get {
        /// The notification ID
        id: String,
    },
    /// Dismiss a notification
    Dismiss {
        /// The notification ID
        id: String,
    },
}

/// Executes a notification command
pub async fn execute(
    client: &LostFoundClient,
    cmd: NotificationCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        NotificationCommands::List => {
            let notifications = client.list_notifications().await?;
            output::print_notifications(&notifications, config);
        }
        NotificationCommands::Get { id } => {
            match client.get_notification(&id).await? {
                Some(notification) => output::print_notification(&notification, config),
                None => return Err(format!("Notification not found: {}", id).into()),
            }
        }
        NotificationCommands::Dismiss { id } => {
            client.dismiss_notification(&id).await?;
            output::print_success(&format!("Dismissed notification {}", id), config);
        }
    }
    Ok(())
}
