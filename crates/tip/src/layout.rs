//! Pure placement math for hint bubbles.

use tourguide_core_types::StepPosition;
use tourguide_dom::{Insets, Point, Rect, Size};

use crate::model::TipInfo;

/// Collapsed bubble box next to `anchor`, fitted into the viewport.
pub fn place(anchor: Rect, bubble: Size, info: &TipInfo, viewport: Size) -> Rect {
    let center = anchor.center();
    let origin = match info.position {
        StepPosition::Right => Point::new(
            anchor.right() + info.space,
            center.y - bubble.height / 2.0,
        ),
        StepPosition::Left => Point::new(
            anchor.x - info.space - bubble.width,
            center.y - bubble.height / 2.0,
        ),
        StepPosition::Bottom => Point::new(
            center.x - bubble.width / 2.0,
            anchor.bottom() + info.space,
        ),
        StepPosition::Top => Point::new(
            center.x - bubble.width / 2.0,
            anchor.y - info.space - bubble.height,
        ),
    };
    Rect::from_origin(origin, bubble).fit_within(viewport)
}

/// Hover padding around the bubble. The side facing the anchor only covers
/// the gap so the pointer can travel between the two without leaving.
pub fn overlay_insets(info: &TipInfo) -> Insets {
    let pick = |facing: bool, padding: f64| if facing { -info.space } else { -padding };
    Insets {
        top: pick(info.position == StepPosition::Bottom, info.overlay.y),
        right: pick(info.position == StepPosition::Left, info.overlay.x),
        bottom: pick(info.position == StepPosition::Top, info.overlay.y),
        left: pick(info.position == StepPosition::Right, info.overlay.x),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Expansion {
    pub rect: Rect,
    pub margin_left: f64,
    pub margin_top: f64,
    pub inverse: bool,
}

/// Grow a collapsed bubble to its content size.
///
/// Growth goes away from the anchor for `left`/`top` tips, and flips
/// (`inverse`) when the content would run past the viewport edge.
pub fn expand(
    placement: Rect,
    collapsed: Size,
    content: Size,
    info: &TipInfo,
    viewport: Size,
) -> Expansion {
    let vertical = info.position.is_vertical();
    let overflow = if vertical {
        placement.x + content.width + info.overlay.x > viewport.width
    } else {
        placement.y + content.height + info.overlay.y > viewport.height
    };
    let mut margin_left = 0.0;
    let mut margin_top = 0.0;
    if (vertical && overflow) || info.position == StepPosition::Left {
        margin_left = -(content.width - collapsed.width);
    }
    if (!vertical && overflow) || info.position == StepPosition::Top {
        margin_top = -(content.height - collapsed.height);
    }
    Expansion {
        rect: Rect::from_origin(placement.origin(), content),
        margin_left,
        margin_top,
        inverse: overflow,
    }
}
