mod client;
mod commands;
mod output;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use client::LostFoundClient;
use lostfound::config;
use output::{OutputConfig, OutputFormat};

/// Default server address when neither a flag nor the config file names one
const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// CLI for the campus lost & found registry
#[derive(Parser, Debug)]
#[clap(name = "lostfound-cli", about = "CLI for the campus lost & found registry")]
struct Cli {
    /// Server URL to connect to
    #[clap(long, env = "LOSTFOUND_URL", global = true)]
    server_url: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs or counts)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage lost and found reports
    #[command(subcommand)]
    Item(commands::item::ItemCommands),
    /// Manage match notifications
    #[command(subcommand)]
    Notification(commands::notification::NotificationCommands),
    /// Tag and describe a photo without filing a report
    Analyze {
        /// Path to the photo
        path: PathBuf,
    },
}

/// Resolves the server URL from CLI args, config file, or defaults
///
/// Precedence: CLI flag / env var > config file > default
fn resolve_server_url(cli_url: Option<String>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    let config_path = config::get_config_dir_path().map(|dir| dir.join("config.toml"));
    if let Ok(update) = config::config_from_file(config_path) {
        if let Some(url) = update.server_url {
            return url;
        }
    }

    DEFAULT_SERVER_URL.to_string()
}

/// Formats an error for human-readable stderr output
fn format_error(err: &dyn std::error::Error) -> String {
    let err_string = err.to_string();

    // ClientError::Request wraps reqwest errors; check for connection issues
    if err_string.contains("error sending request")
        || err_string.contains("connection refused")
        || err_string.contains("Connection refused")
        || err_string.contains("tcp connect error")
    {
        return format!(
            "Could not connect to server. Is lostfound running?\n  {}",
            err_string
        );
    }

    err_string
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server_url = resolve_server_url(cli.server_url);
    let client = LostFoundClient::new(server_url);
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Item(cmd) => commands::item::execute(&client, cmd, &output_config).await,
        Commands::Notification(cmd) => {
            commands::notification::execute(&client, cmd, &output_config).await
        }
        Commands::Analyze { path } => commands::analyze::execute(&client, &path, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}
