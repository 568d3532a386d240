use thiserror::Error;
use tourguide_core_types::GuideError;
use tourguide_registry::RegistryError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("tour not found: {0}")]
    NotFound(String),
    #[error("tour {0} cannot be skipped")]
    SkipDisabled(String),
    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for RunnerError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(name) => RunnerError::NotFound(name),
            other => RunnerError::Registry(other),
        }
    }
}

impl From<RunnerError> for GuideError {
    fn from(value: RunnerError) -> Self {
        GuideError::new(value.to_string())
    }
}
