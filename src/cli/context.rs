use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tourguide_registry::{load_path, RegistryImpl};
use tracing::debug;

use crate::config::AppConfig;

pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: Option<PathBuf>,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Command-line paths win over the configured `tour_paths`.
    pub fn tour_paths(&self, requested: &[PathBuf]) -> Vec<PathBuf> {
        if requested.is_empty() {
            self.config.tour_paths.clone()
        } else {
            requested.to_vec()
        }
    }

    /// Registry holding every tour under `paths`. Fails on the first bad file.
    pub fn load_registry(&self, paths: &[PathBuf]) -> Result<Arc<RegistryImpl>> {
        let registry = Arc::new(RegistryImpl::new());
        for path in paths {
            let names = load_path(registry.as_ref(), path)
                .with_context(|| format!("loading tours from {}", path.display()))?;
            debug!(path = %path.display(), tours = names.len(), "tours loaded");
        }
        Ok(registry)
    }
}
