use thiserror::Error;

use tourguide_core_types::{ElementId, GuideError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TipError {
    /// The anchor is not part of the rendered document any more.
    #[error("anchor {0} is not in the document")]
    AnchorLost(ElementId),
    #[error("tip already disposed")]
    Disposed,
}

impl From<TipError> for GuideError {
    fn from(err: TipError) -> Self {
        GuideError::new(err.to_string())
    }
}
