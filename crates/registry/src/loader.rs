//! Tour files.
//!
//! A tour file is YAML holding either a single tour or a `tours:` list:
//!
//! ```yaml
//! tours:
//!   - name: question
//!     options: { skip_enabled: true, url: /forum }
//!     steps:
//!       - trigger: "a[data-action=new_forum]"
//!         content: Select this menu item to create a new forum.
//!         position: left
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::api::Registry;
use crate::errors::RegistryError;
use crate::model::TourDefinition;

#[derive(Deserialize)]
#[serde(untagged)]
enum TourDocument {
    Many { tours: Vec<TourDefinition> },
    One(TourDefinition),
}

pub fn parse_tours(source: &str, origin: &str) -> Result<Vec<TourDefinition>, RegistryError> {
    let document: TourDocument =
        serde_yaml::from_str(source).map_err(|err| RegistryError::Load {
            origin: origin.to_string(),
            reason: err.to_string(),
        })?;
    Ok(match document {
        TourDocument::Many { tours } => tours,
        TourDocument::One(tour) => vec![tour],
    })
}

/// Load every tour found at `path` (a file, or a directory of `*.yaml` /
/// `*.yml` files visited in name order) into `registry`. Returns the names
/// registered, in load order.
pub fn load_path(registry: &dyn Registry, path: &Path) -> Result<Vec<String>, RegistryError> {
    let files = tour_files(path)?;
    let mut names = Vec::new();
    for file in files {
        let origin = file.display().to_string();
        let source = fs::read_to_string(&file).map_err(|err| RegistryError::Load {
            origin: origin.clone(),
            reason: err.to_string(),
        })?;
        for tour in parse_tours(&source, &origin)? {
            let definition = registry.register(&tour.name, tour.options, tour.steps)?;
            names.push(definition.name.clone());
        }
        info!(target: "registry", file = %origin, "loaded tour file");
    }
    Ok(names)
}

/// Tour files under `path`: the file itself, or the `*.yaml` / `*.yml`
/// files of a directory in name order.
pub fn tour_files(path: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let load_err = |reason: String| RegistryError::Load {
        origin: path.display().to_string(),
        reason,
    };
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(load_err("no such file or directory".into()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| load_err(err.to_string()))? {
        let entry = entry.map_err(|err| load_err(err.to_string()))?;
        let candidate = entry.path();
        let is_yaml = candidate
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if candidate.is_file() && is_yaml {
            files.push(candidate);
        } else {
            warn!(target: "registry", path = %candidate.display(), "skipping non-tour entry");
        }
    }
    files.sort();
    Ok(files)
}
