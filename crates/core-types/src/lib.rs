#![allow(dead_code)]

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the tourguide crates.
#[derive(Debug, Error, Clone)]
pub enum GuideError {
    #[error("{message}")]
    Message { message: String },
}

impl GuideError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Stable host-assigned identity of a document element.
///
/// The same element keeps the same id across snapshots, which is how anchor
/// changes are detected between poll ticks.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TipId(pub String);

impl TipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque selector expression evaluated against a document snapshot.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Predicate(pub String);

impl Predicate {
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for Predicate {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Side of the anchor a hint bubble is attached to.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum StepPosition {
    Top,
    Bottom,
    Left,
    #[default]
    Right,
}

impl StepPosition {
    pub fn is_vertical(self) -> bool {
        matches!(self, StepPosition::Top | StepPosition::Bottom)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepPosition::Top => "top",
            StepPosition::Bottom => "bottom",
            StepPosition::Left => "left",
            StepPosition::Right => "right",
        }
    }
}

impl fmt::Display for StepPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle shared by the presentation pieces (tips, tour runs).
pub trait Widget {
    fn mount(&mut self) -> Result<(), GuideError>;
    fn dispose(&mut self);
    fn is_mounted(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_predicates_are_detected() {
        assert!(Predicate::new("  ").is_blank());
        assert!(!Predicate::from("#a").is_blank());
    }

    #[test]
    fn default_position_is_right() {
        assert_eq!(StepPosition::default(), StepPosition::Right);
        assert!(StepPosition::Top.is_vertical());
        assert!(!StepPosition::Left.is_vertical());
    }
}
