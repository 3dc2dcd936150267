mod app;
mod browser;
mod view;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use tracing_subscriber::{prelude::*, EnvFilter};
use updown_core::{
    config::{self, AppConfig},
    Catalog,
};

#[tokio::main]
async fn main() -> Result<()> {
    let written = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;
    if let Some(path) = written {
        tracing::info!(path = %path.display(), "Default config written");
    }

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => Catalog::sample(),
    };
    tracing::info!(total = catalog.len(), "Catalog ready");

    let mut app = app::UpdownApp::new(catalog, config);
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = if config.log_dir.is_absolute() {
        config.log_dir.clone()
    } else {
        std::env::current_dir()?.join(&config.log_dir)
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("updown.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
