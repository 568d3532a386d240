use std::collections::HashMap;

use parking_lot::Mutex;
use tourguide_core_types::TipId;
use tourguide_dom::Size;

use crate::model::TipFrame;

/// Where hint bubbles are drawn. Calls happen with the tip's state locked,
/// so implementations must not call back into the tip.
pub trait TipSurface: Send + Sync {
    /// Size of a bubble in its collapsed state.
    fn collapsed_size(&self) -> Size;
    /// Natural size of `content` laid out within `width`.
    fn measure_content(&self, content: &str, width: f64) -> Size;
    fn render(&self, frame: &TipFrame);
    fn remove(&self, tip: &TipId);
}

const CHAR_WIDTH: f64 = 7.0;
const LINE_HEIGHT: f64 = 18.0;
const PADDING: f64 = 16.0;

/// Headless surface that keeps the latest frame per tip and counts
/// mutations. Content is measured with a fixed-pitch estimate unless a fixed
/// size is configured.
pub struct MemorySurface {
    collapsed: Size,
    content_size: Option<Size>,
    frames: Mutex<HashMap<TipId, TipFrame>>,
    mutations: Mutex<usize>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new(Size::new(28.0, 28.0))
    }
}

impl MemorySurface {
    pub fn new(collapsed: Size) -> Self {
        Self {
            collapsed,
            content_size: None,
            frames: Mutex::new(HashMap::new()),
            mutations: Mutex::new(0),
        }
    }

    pub fn with_content_size(mut self, size: Size) -> Self {
        self.content_size = Some(size);
        self
    }

    pub fn frame(&self, tip: &TipId) -> Option<TipFrame> {
        self.frames.lock().get(tip).cloned()
    }

    pub fn frames(&self) -> Vec<TipFrame> {
        self.frames.lock().values().cloned().collect()
    }

    pub fn visible(&self) -> usize {
        self.frames.lock().len()
    }

    /// Renders plus removals seen so far.
    pub fn mutations(&self) -> usize {
        *self.mutations.lock()
    }
}

impl TipSurface for MemorySurface {
    fn collapsed_size(&self) -> Size {
        self.collapsed
    }

    fn measure_content(&self, content: &str, width: f64) -> Size {
        if let Some(size) = self.content_size {
            return size;
        }
        let natural = content.chars().count() as f64 * CHAR_WIDTH;
        let inner = (width - PADDING).max(CHAR_WIDTH);
        let lines = (natural / inner).ceil().max(1.0);
        let measured_width = (natural.min(inner) + PADDING).max(self.collapsed.width);
        Size::new(measured_width, lines * LINE_HEIGHT + PADDING)
    }

    fn render(&self, frame: &TipFrame) {
        self.frames.lock().insert(frame.tip.clone(), frame.clone());
        *self.mutations.lock() += 1;
    }

    fn remove(&self, tip: &TipId) {
        if self.frames.lock().remove(tip).is_some() {
            *self.mutations.lock() += 1;
        }
    }
}
