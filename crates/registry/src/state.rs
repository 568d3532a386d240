use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::{
    api::Registry,
    errors::RegistryError,
    model::{TourDefinition, TourOptions, TourStep},
};

/// In-memory tour registry. Constructed explicitly and injected wherever it
/// is needed.
#[derive(Default)]
pub struct RegistryImpl {
    tours: DashMap<String, Arc<TourDefinition>>,
}

impl RegistryImpl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    pub fn register_definition(
        &self,
        definition: TourDefinition,
    ) -> Result<Arc<TourDefinition>, RegistryError> {
        self.register(&definition.name, definition.options, definition.steps)
    }
}

fn validate(name: &str, steps: &[TourStep]) -> Result<(), RegistryError> {
    if name.trim().is_empty() {
        return Err(RegistryError::EmptyName);
    }
    for (index, step) in steps.iter().enumerate() {
        if step.trigger.is_blank() {
            return Err(RegistryError::InvalidStep {
                tour: name.to_string(),
                index,
                reason: "missing trigger".into(),
            });
        }
        if step.extra_trigger.as_ref().is_some_and(|p| p.is_blank()) {
            return Err(RegistryError::InvalidStep {
                tour: name.to_string(),
                index,
                reason: "blank extra_trigger".into(),
            });
        }
        if step.width.is_some_and(|w| !w.is_finite() || w <= 0.0) {
            return Err(RegistryError::InvalidStep {
                tour: name.to_string(),
                index,
                reason: "width must be positive".into(),
            });
        }
    }
    Ok(())
}

impl Registry for RegistryImpl {
    fn register(
        &self,
        name: &str,
        options: TourOptions,
        steps: Vec<TourStep>,
    ) -> Result<Arc<TourDefinition>, RegistryError> {
        validate(name, &steps)?;
        let definition = Arc::new(TourDefinition {
            name: name.to_string(),
            options,
            steps,
        });
        let replaced = self
            .tours
            .insert(name.to_string(), Arc::clone(&definition))
            .is_some();
        info!(
            target: "registry",
            tour = name,
            steps = definition.len(),
            replaced,
            "tour registered"
        );
        Ok(definition)
    }

    fn get(&self, name: &str) -> Result<Arc<TourDefinition>, RegistryError> {
        self.tours
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn contains(&self, name: &str) -> bool {
        self.tours.contains_key(name)
    }

    fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tours.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn matching_url(&self, url: &str) -> Vec<Arc<TourDefinition>> {
        let mut matched: Vec<Arc<TourDefinition>> = self
            .tours
            .iter()
            .filter(|entry| entry.value().options.url_matches(url))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(target: "registry", url, matched = matched.len(), "url lookup");
        matched
    }

    fn clear(&self) {
        self.tours.clear();
    }
}
