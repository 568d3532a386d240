use std::sync::Arc;

use crate::errors::RegistryError;
use crate::model::{TourDefinition, TourOptions, TourStep};

pub trait Registry: Send + Sync {
    /// Store a tour under `name`. Registering an existing name replaces it.
    fn register(
        &self,
        name: &str,
        options: TourOptions,
        steps: Vec<TourStep>,
    ) -> Result<Arc<TourDefinition>, RegistryError>;
    fn get(&self, name: &str) -> Result<Arc<TourDefinition>, RegistryError>;
    fn contains(&self, name: &str) -> bool;
    fn list(&self) -> Vec<String>;
    fn matching_url(&self, url: &str) -> Vec<Arc<TourDefinition>>;
    fn clear(&self);
}

impl<R> Registry for Arc<R>
where
    R: Registry + ?Sized,
{
    fn register(
        &self,
        name: &str,
        options: TourOptions,
        steps: Vec<TourStep>,
    ) -> Result<Arc<TourDefinition>, RegistryError> {
        (**self).register(name, options, steps)
    }

    fn get(&self, name: &str) -> Result<Arc<TourDefinition>, RegistryError> {
        (**self).get(name)
    }

    fn contains(&self, name: &str) -> bool {
        (**self).contains(name)
    }

    fn list(&self) -> Vec<String> {
        (**self).list()
    }

    fn matching_url(&self, url: &str) -> Vec<Arc<TourDefinition>> {
        (**self).matching_url(url)
    }

    fn clear(&self) {
        (**self).clear()
    }
}
