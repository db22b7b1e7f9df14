use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use clap::Parser;
use std::fs;
use tracing::{info, warn};

/// Default Gemini API root
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the Lost & Found server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_address: String,
    /// API key for the Gemini service; AI features are disabled without one
    pub gemini_api_key: Option<String>,
    /// Root URL of the Gemini REST API
    pub gemini_base_url: String,
    /// Model used to tag and describe photos
    pub tagging_model: String,
    /// Model used to compare reports
    pub matching_model: String,
    /// Thinking tokens granted to the matching model
    pub thinking_budget: u32,
    /// Matches must score strictly above this confidence (0-100)
    pub match_confidence_threshold: f64,
    /// How many prefiltered candidates are sent for comparison
    pub match_candidate_limit: usize,
    /// Largest accepted photo, in decoded bytes
    pub max_image_bytes: usize,
    /// Timeout for each AI request, in seconds
    pub request_timeout_secs: u64,
    /// Directory for rolling JSON log files; stdout only when unset
    pub log_dir: Option<String>,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub gemini_base_url: Option<String>,
    #[serde(default)]
    pub tagging_model: Option<String>,
    #[serde(default)]
    pub matching_model: Option<String>,
    #[serde(default)]
    pub thinking_budget: Option<u32>,
    #[serde(default)]
    pub match_confidence_threshold: Option<f64>,
    #[serde(default)]
    pub match_candidate_limit: Option<usize>,
    #[serde(default)]
    pub max_image_bytes: Option<usize>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log_dir: Option<String>,
    /// Server URL used by the CLI; ignored by the server
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Command line arguments for the server
#[derive(Parser, Debug)]
#[clap(name = "lostfound", about = "Campus lost & found server")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to listen on, e.g. 0.0.0.0:3000
    #[clap(long, env = "LOSTFOUND_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Gemini API key
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini API root URL
    #[clap(long, env = "GEMINI_BASE_URL")]
    pub gemini_base_url: Option<String>,

    /// Model used to tag photos
    #[clap(long, env = "LOSTFOUND_TAGGING_MODEL")]
    pub tagging_model: Option<String>,

    /// Model used to compare reports
    #[clap(long, env = "LOSTFOUND_MATCHING_MODEL")]
    pub matching_model: Option<String>,

    /// Thinking tokens granted to the matching model
    #[clap(long, env = "LOSTFOUND_THINKING_BUDGET")]
    pub thinking_budget: Option<u32>,

    /// Confidence a match must exceed to be reported
    #[clap(long, env = "LOSTFOUND_MATCH_THRESHOLD")]
    pub match_confidence_threshold: Option<f64>,

    /// How many prefiltered candidates are sent for comparison
    #[clap(long, env = "LOSTFOUND_MATCH_CANDIDATES")]
    pub match_candidate_limit: Option<usize>,

    /// Largest accepted photo, in decoded bytes
    #[clap(long, env = "LOSTFOUND_MAX_IMAGE_BYTES")]
    pub max_image_bytes: Option<usize>,

    /// Timeout for each AI request, in seconds
    #[clap(long, env = "LOSTFOUND_REQUEST_TIMEOUT")]
    pub request_timeout_secs: Option<u64>,

    /// Directory for JSON log files
    #[clap(long, env = "LOSTFOUND_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Debug mode
    #[clap(long, env = "LOSTFOUND_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            bind_address: update.bind_address.unwrap_or(self.bind_address),
            gemini_api_key: update.gemini_api_key.or(self.gemini_api_key),
            gemini_base_url: update.gemini_base_url.unwrap_or(self.gemini_base_url),
            tagging_model: update.tagging_model.unwrap_or(self.tagging_model),
            matching_model: update.matching_model.unwrap_or(self.matching_model),
            thinking_budget: update.thinking_budget.unwrap_or(self.thinking_budget),
            match_confidence_threshold: update.match_confidence_threshold.unwrap_or(self.match_confidence_threshold),
            match_candidate_limit: update.match_candidate_limit.unwrap_or(self.match_candidate_limit),
            max_image_bytes: update.max_image_bytes.unwrap_or(self.max_image_bytes),
            request_timeout_secs: update.request_timeout_secs.unwrap_or(self.request_timeout_secs),
            log_dir: update.log_dir.or(self.log_dir),
        }
    }

    /// Returns the AI request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Returns the base (default) configuration
///
/// The database file lives in `data_path` when one is given, otherwise in
/// the working directory.
pub fn base_config(data_path: Option<PathBuf>) -> Config {
    let database_url = data_path.map_or("lostfound.db".to_string(), |path| path.join("lostfound.db").to_string_lossy().to_string());

    Config {
        database_url,
        bind_address: "127.0.0.1:3000".to_string(),
        gemini_api_key: None,
        gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        tagging_model: "gemini-3-flash-preview".to_string(),
        matching_model: "gemini-3-pro-preview".to_string(),
        thinking_budget: 4000,
        match_confidence_threshold: 75.0,
        match_candidate_limit: 3,
        max_image_bytes: 5 * 1024 * 1024,
        request_timeout_secs: 60,
        log_dir: None,
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            },
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        bind_address: args.bind_address,
        gemini_api_key: args.gemini_api_key,
        gemini_base_url: args.gemini_base_url,
        tagging_model: args.tagging_model,
        matching_model: args.matching_model,
        thinking_budget: args.thinking_budget,
        match_confidence_threshold: args.match_confidence_threshold,
        match_candidate_limit: args.match_candidate_limit,
        max_image_bytes: args.max_image_bytes,
        request_timeout_secs: args.request_timeout_secs,
        log_dir: args.log_dir,
        ..ConfigUpdate::default()
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    let dirs = ProjectDirs::from("edu", "lostfound", "lostfound");
    if dirs.is_none() {
        warn!("Could not determine XDG directories, skipping config file");
    }
    dirs
}

/// Returns the XDG config directory if it exists on disk
pub fn get_config_dir_path() -> Option<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .filter(|path| path.exists())
}

/// Returns the XDG data directory if it exists on disk
pub fn get_data_dir_path() -> Option<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .filter(|path| path.exists())
}

/// Layers the config file at `config_path` and the arguments over the defaults
///
/// A config file that exists but cannot be read or parsed is an error.
pub fn load_config(
    args: CliArgs,
    config_path: Option<PathBuf>,
    data_path: Option<PathBuf>,
) -> Result<Config, String> {
    let file_update = config_from_file(config_path)?;

    Ok(base_config(data_path)
        .apply_update(file_update)
        .apply_update(config_from_args(args)))
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> Result<Config, String> {
    let config_path = get_config_dir_path().map(|dir| dir.join("config.toml"));
    load_config(args, config_path, get_data_dir_path())
}
