use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use lostfound::config::{get_config, CliArgs, Config};
use lostfound::{create_app, db, run_migrations, AppState};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Sets up stdout logging plus, when `log_dir` is set, daily JSON log files
///
/// The returned guard flushes the file writer and must live as long as the server.
fn init_tracing(config: &Config, debug: bool) -> Option<WorkerGuard> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stdout_layer = fmt::layer().with_target(true).with_filter(filter());

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lostfound.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let debug = args.debug;

    // Logging needs log_dir, so a bad config file is reported through the returned error
    let config = get_config(args).map_err(|e| anyhow!(e))?;
    let _guard = init_tracing(&config, debug);

    info!("Starting lost & found server");
    info!(
        "Final configuration: database_url={}, bind_address={}, ai_enabled={}, threshold={}, candidates={}",
        config.database_url,
        config.bind_address,
        config.gemini_api_key.is_some(),
        config.match_confidence_threshold,
        config.match_candidate_limit
    );

    let pool = Arc::new(db::init_pool(&config.database_url)?);
    {
        let mut conn = pool.get().context("Failed to get a connection for migrations")?;
        run_migrations(&mut conn)?;
    }

    let state = AppState::from_config(&config, pool)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
