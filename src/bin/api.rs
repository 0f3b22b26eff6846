//! PeakStreak API Server
//!
//! Run with: cargo run --bin peakstreak-api
//!
//! # Configuration
//!
//! Settings come from the first config file found in
//! `<config_dir>/peakstreak/config.toml`, `/etc/peakstreak/config.toml` or
//! `./config.toml` (or the path given with `--config`), then
//! `PEAKSTREAK_*` environment variables. `RUST_LOG` overrides the
//! configured log level.
//!
//! The server will not start without `PEAKSTREAK_JWT_SECRET` (or
//! `[auth].jwt_secret`).

use anyhow::{bail, Context};
use clap::Parser;
use peakstreak::api::{serve, ApiConfig, AppState};
use peakstreak::auth::TokenIssuer;
use peakstreak::config::{Config, LoggingConfig};
use peakstreak::repository::SqliteRepository;
use peakstreak::service::{Service, ServiceOptions};
use peakstreak::uploads::LocalStorage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "peakstreak-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PeakStreak habit tracker API server")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!("Starting PeakStreak API server v{}", env!("CARGO_PKG_VERSION"));

    if config.auth.jwt_secret.trim().is_empty() {
        bail!("JWT secret is not set; set PEAKSTREAK_JWT_SECRET or [auth].jwt_secret");
    }

    // Initialize database
    let db_path = config.database.resolved_path();
    tracing::info!("Database: {:?}", db_path);
    let repo = SqliteRepository::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;

    // Avatar storage
    let storage = LocalStorage::new(&config.uploads.avatar_dir, &config.uploads.public_prefix);
    storage
        .ensure_dir()
        .await
        .with_context(|| format!("creating avatar directory {}", config.uploads.avatar_dir))?;
    tracing::info!("Avatars: {:?} served at {}", storage.root(), storage.public_prefix());

    let service = Service::new(
        Arc::new(repo),
        Arc::new(storage),
        TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_hours),
        ServiceOptions {
            max_avatar_bytes: config.uploads.max_avatar_bytes,
            leaderboard_limit: config.api.leaderboard_limit,
            explore_limit: config.api.explore_limit,
        },
    );

    let api_config = ApiConfig::from_config(&config);
    if !api_config.static_dir.join("index.html").exists() {
        tracing::warn!(
            "No index.html in {:?}; only the API will be useful",
            api_config.static_dir
        );
    }

    // Run server
    let state = AppState::new(service, api_config.clone());
    serve(state, &api_config).await?;

    tracing::info!("PeakStreak API server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("peakstreak={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
