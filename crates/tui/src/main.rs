mod app;
mod block_font;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use tui2048_core::{
    config::{self, AppConfig},
    FileScoreStore, GameSession,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    let rules = config.rules()?;
    info!(
        size = rules.size,
        seed = ?config.seed,
        policy = ?config.best_score_policy,
        "Starting 2048"
    );

    let session = match config.seed {
        Some(seed) => GameSession::seeded(rules, seed)?,
        None => GameSession::from_entropy(rules)?,
    };
    let store = FileScoreStore::new(&config.data_dir, config.board_size);
    let session = session.with_store(store, config.best_score_policy);

    let mut app = app::Tui2048App::new(session);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("2048tui.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal belongs to the UI, so only the file layer is installed.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
