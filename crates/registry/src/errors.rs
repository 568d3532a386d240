#![allow(dead_code)]

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tour not found: {0}")]
    NotFound(String),
    #[error("tour {tour}: step {index} is invalid: {reason}")]
    InvalidStep {
        tour: String,
        index: usize,
        reason: String,
    },
    #[error("tour name must not be empty")]
    EmptyName,
    #[error("failed to load tours from {origin}: {reason}")]
    Load { origin: String, reason: String },
}

impl RegistryError {
    pub fn into_guide_error(self, detail: impl Into<String>) -> tourguide_core_types::GuideError {
        let message = format!("{}: {}", self, detail.into());
        tourguide_core_types::GuideError::new(message)
    }
}

impl From<RegistryError> for tourguide_core_types::GuideError {
    fn from(err: RegistryError) -> Self {
        tourguide_core_types::GuideError::new(err.to_string())
    }
}
