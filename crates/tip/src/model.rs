use std::time::Duration;

use serde::{Deserialize, Serialize};
use tourguide_core_types::{ElementId, StepPosition, TipId};
use tourguide_dom::{Insets, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayPadding {
    pub x: f64,
    pub y: f64,
}

impl Default for OverlayPadding {
    fn default() -> Self {
        Self { x: 50.0, y: 50.0 }
    }
}

/// Placement parameters of one hint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipInfo {
    pub position: StepPosition,
    /// Width available to the expanded content.
    pub width: f64,
    /// Gap between anchor and bubble.
    pub space: f64,
    /// Hover-sensitive padding around the bubble.
    pub overlay: OverlayPadding,
}

impl Default for TipInfo {
    fn default() -> Self {
        Self {
            position: StepPosition::Right,
            width: 270.0,
            space: 10.0,
            overlay: OverlayPadding::default(),
        }
    }
}

impl TipInfo {
    pub fn with_position(mut self, position: StepPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_width(mut self, width: Option<f64>) -> Self {
        if let Some(width) = width {
            self.width = width;
        }
        self
    }
}

/// Hover debounce delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipTimings {
    pub open_delay_ms: u64,
    pub close_delay_ms: u64,
}

impl Default for TipTimings {
    fn default() -> Self {
        Self {
            open_delay_ms: 100,
            close_delay_ms: 300,
        }
    }
}

impl TipTimings {
    pub fn open_delay(&self) -> Duration {
        Duration::from_millis(self.open_delay_ms)
    }

    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.close_delay_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    MouseEnter,
    MouseLeave,
    MouseDown,
    Change,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InteractionTarget {
    Element(ElementId),
    Tip(TipId),
}

/// A user interaction reported by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interaction {
    pub target: InteractionTarget,
    pub kind: InteractionKind,
}

impl Interaction {
    pub fn on_element(element: ElementId, kind: InteractionKind) -> Self {
        Self {
            target: InteractionTarget::Element(element),
            kind,
        }
    }

    pub fn on_tip(tip: TipId, kind: InteractionKind) -> Self {
        Self {
            target: InteractionTarget::Tip(tip),
            kind,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TipReaction {
    Ignored,
    Hover,
    /// First consuming interaction on the anchor. Reported once per tip.
    Consumed,
}

/// Everything a surface needs to draw a hint.
#[derive(Clone, Debug, PartialEq)]
pub struct TipFrame {
    pub tip: TipId,
    pub anchor: ElementId,
    pub position: StepPosition,
    pub rect: Rect,
    pub margin_left: f64,
    pub margin_top: f64,
    pub overlay: Insets,
    pub active: bool,
    pub inverse: bool,
    pub content: String,
}

impl TipFrame {
    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["o_tooltip", self.position.as_str()];
        if self.active {
            classes.push("active");
        }
        if self.inverse {
            classes.push("inverse");
        }
        classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }
}
