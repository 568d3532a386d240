use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

pub fn init_logging(level: &str, debug: bool, json: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    // Logs go to stderr so command output on stdout stays machine-readable.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: Option<PathBuf>,
}

/// Candidate config files, most specific first.
pub fn config_candidates(explicit: Option<&PathBuf>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.clone()];
    }
    let mut candidates = vec![PathBuf::from("config/tourguide.yaml")];
    if let Some(mut path) = dirs::config_dir() {
        path.push("tourguide");
        path.push("config.yaml");
        candidates.push(path);
    }
    candidates
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let candidates = config_candidates(config_path);
    let found = candidates.iter().find(|path| path.exists()).cloned();

    let mut loaded = match found {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config = AppConfig::from_yaml(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            info!("Loaded configuration from: {}", path.display());
            LoadedConfig {
                config,
                path: Some(path),
            }
        }
        None => {
            if let Some(explicit) = config_path {
                anyhow::bail!("Config file not found: {}", explicit.display());
            }
            warn!("No config file found, using defaults");
            LoadedConfig {
                config: AppConfig::default(),
                path: None,
            }
        }
    };
    loaded.config.apply_env_overrides();
    Ok(loaded)
}
