//! Error types for predicate evaluation

use thiserror::Error;
use tourguide_core_types::GuideError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// Expression could not be parsed
    #[error("invalid selector '{expr}': {reason}")]
    Syntax { expr: String, reason: String },

    /// Expression parsed but uses something the evaluator cannot answer
    #[error("unsupported selector feature '{feature}' in '{expr}'")]
    Unsupported { expr: String, feature: String },
}

impl PredicateError {
    pub(crate) fn syntax(expr: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(expr: &str, feature: impl Into<String>) -> Self {
        Self::Unsupported {
            expr: expr.to_string(),
            feature: feature.into(),
        }
    }
}

impl From<PredicateError> for GuideError {
    fn from(err: PredicateError) -> Self {
        GuideError::new(err.to_string())
    }
}
