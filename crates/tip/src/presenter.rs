//! Hint bubble bound to one anchor element.
//!
//! Hover handling uses two mutually cancelling timers: entering schedules an
//! expand after `open_delay`, leaving schedules a collapse after
//! `close_delay`, and a reverse move while a timer is pending cancels it
//! instead of scheduling the opposite transition. Timers run as tokio tasks,
//! so hover interactions must be delivered from within a runtime.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tourguide_core_types::{ElementId, GuideError, TipId, Widget};
use tourguide_dom::{ElementNode, Rect, Size};
use tracing::{debug, info, trace};

use crate::errors::TipError;
use crate::layout;
use crate::model::{
    Interaction, InteractionKind, InteractionTarget, TipFrame, TipInfo, TipReaction, TipTimings,
};
use crate::ports::TipSurface;

#[derive(Clone, Debug)]
struct AnchorBinding {
    element: ElementId,
    consume_on: InteractionKind,
}

impl AnchorBinding {
    fn for_node(node: &ElementNode) -> Self {
        let consume_on = if node.is_text_input() {
            InteractionKind::Change
        } else {
            InteractionKind::MouseDown
        };
        Self {
            element: node.id.clone(),
            consume_on,
        }
    }
}

struct PendingTimer {
    generation: u64,
    token: CancellationToken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HoverTransition {
    Expand,
    Collapse,
}

struct TipCore {
    // `None` once disposed: no listener survives teardown.
    binding: Option<AnchorBinding>,
    anchor_rect: Rect,
    viewport: Size,
    info: TipInfo,
    collapsed: Size,
    placement: Rect,
    frame: TipFrame,
    consumed: bool,
    opened: bool,
    mounted: bool,
    timer_in: Option<PendingTimer>,
    timer_out: Option<PendingTimer>,
    generation: u64,
}

impl TipCore {
    fn reposition(&mut self) {
        if self.opened {
            return;
        }
        self.placement = layout::place(self.anchor_rect, self.collapsed, &self.info, self.viewport);
        self.frame.rect = self.placement;
        self.frame.overlay = layout::overlay_insets(&self.info);
    }

    fn cancel_timers(&mut self) {
        for timer in [self.timer_in.take(), self.timer_out.take()].into_iter().flatten() {
            timer.token.cancel();
        }
    }

    fn expand(&mut self, surface: &dyn TipSurface) {
        let content = surface.measure_content(&self.frame.content, self.info.width);
        self.opened = true;
        let expansion =
            layout::expand(self.placement, self.collapsed, content, &self.info, self.viewport);
        self.frame.rect = expansion.rect;
        self.frame.margin_left = expansion.margin_left;
        self.frame.margin_top = expansion.margin_top;
        self.frame.inverse = expansion.inverse;
        self.frame.active = true;
        surface.render(&self.frame);
    }

    fn collapse(&mut self, surface: &dyn TipSurface) {
        self.opened = false;
        self.frame.rect = self.placement;
        self.frame.margin_left = 0.0;
        self.frame.margin_top = 0.0;
        self.frame.active = false;
        self.frame.inverse = false;
        surface.render(&self.frame);
    }
}

pub struct Tip {
    id: TipId,
    core: Arc<Mutex<TipCore>>,
    surface: Arc<dyn TipSurface>,
    timings: TipTimings,
}

impl Tip {
    /// Build a tip next to `anchor` and draw it. Fails with
    /// [`TipError::AnchorLost`] when the anchor has no layout.
    pub fn show(
        anchor: &ElementNode,
        viewport: Size,
        info: TipInfo,
        content: impl Into<String>,
        surface: Arc<dyn TipSurface>,
        timings: TipTimings,
    ) -> Result<Self, TipError> {
        let rect = rendered_rect(anchor)?;
        let id = TipId::new();
        let collapsed = surface.collapsed_size();
        let frame = TipFrame {
            tip: id.clone(),
            anchor: anchor.id.clone(),
            position: info.position,
            rect: Rect::default(),
            margin_left: 0.0,
            margin_top: 0.0,
            overlay: layout::overlay_insets(&info),
            active: false,
            inverse: false,
            content: content.into(),
        };
        let core = TipCore {
            binding: Some(AnchorBinding::for_node(anchor)),
            anchor_rect: rect,
            viewport,
            info,
            collapsed,
            placement: Rect::default(),
            frame,
            consumed: false,
            opened: false,
            mounted: false,
            timer_in: None,
            timer_out: None,
            generation: 0,
        };
        let mut tip = Self {
            id,
            core: Arc::new(Mutex::new(core)),
            surface,
            timings,
        };
        tip.mount().map_err(|_| TipError::Disposed)?;
        debug!(target: "tip", tip = %tip.id, anchor = %anchor.id, "tip shown");
        Ok(tip)
    }

    pub fn id(&self) -> &TipId {
        &self.id
    }

    pub fn anchor(&self) -> Option<ElementId> {
        self.core.lock().binding.as_ref().map(|b| b.element.clone())
    }

    pub fn consume_on(&self) -> Option<InteractionKind> {
        self.core.lock().binding.as_ref().map(|b| b.consume_on)
    }

    pub fn is_consumed(&self) -> bool {
        self.core.lock().consumed
    }

    pub fn is_opened(&self) -> bool {
        self.core.lock().opened
    }

    pub fn has_pending_timer(&self) -> bool {
        let core = self.core.lock();
        core.timer_in.is_some() || core.timer_out.is_some()
    }

    pub fn frame(&self) -> TipFrame {
        self.core.lock().frame.clone()
    }

    /// Follow the anchor to its latest node. Listeners move only when the
    /// element itself changed; consumption and pending hover timers carry
    /// over. Returns whether a rebind happened.
    pub fn update(&self, anchor: &ElementNode, viewport: Size) -> Result<bool, TipError> {
        let mut core = self.core.lock();
        let current = core.binding.as_ref().ok_or(TipError::Disposed)?;
        let rect = rendered_rect(anchor)?;
        let rebound = current.element != anchor.id;
        if rebound {
            debug!(
                target: "tip",
                tip = %self.id,
                from = %current.element,
                to = %anchor.id,
                "rebinding tip anchor"
            );
            core.binding = Some(AnchorBinding::for_node(anchor));
            core.frame.anchor = anchor.id.clone();
        }
        let moved = core.anchor_rect != rect || core.viewport != viewport;
        core.anchor_rect = rect;
        core.viewport = viewport;
        if (rebound || moved) && !core.opened {
            core.reposition();
            self.surface.render(&core.frame);
        }
        Ok(rebound)
    }

    pub fn handle(&self, interaction: &Interaction) -> TipReaction {
        let mut core = self.core.lock();
        let Some(binding) = core.binding.clone() else {
            return TipReaction::Ignored;
        };
        let on_anchor = matches!(&interaction.target, InteractionTarget::Element(e) if *e == binding.element);
        let on_bubble = matches!(&interaction.target, InteractionTarget::Tip(t) if *t == self.id);
        if !on_anchor && !on_bubble {
            return TipReaction::Ignored;
        }
        match interaction.kind {
            InteractionKind::MouseEnter => {
                self.to_info_mode(&mut core);
                TipReaction::Hover
            }
            InteractionKind::MouseLeave => {
                self.to_bubble_mode(&mut core);
                TipReaction::Hover
            }
            kind if on_anchor && kind == binding.consume_on => {
                if core.consumed {
                    trace!(target: "tip", tip = %self.id, "already consumed");
                    return TipReaction::Ignored;
                }
                core.consumed = true;
                info!(target: "tip", tip = %self.id, anchor = %binding.element, "tip consumed");
                TipReaction::Consumed
            }
            _ => TipReaction::Ignored,
        }
    }

    fn to_info_mode(&self, core: &mut TipCore) {
        if let Some(pending) = core.timer_out.take() {
            pending.token.cancel();
            return;
        }
        if core.timer_in.is_some() || core.opened {
            return;
        }
        core.timer_in = Some(self.schedule(core, HoverTransition::Expand));
    }

    fn to_bubble_mode(&self, core: &mut TipCore) {
        if let Some(pending) = core.timer_in.take() {
            pending.token.cancel();
            return;
        }
        if core.timer_out.is_some() || !core.opened {
            return;
        }
        core.timer_out = Some(self.schedule(core, HoverTransition::Collapse));
    }

    fn schedule(&self, core: &mut TipCore, transition: HoverTransition) -> PendingTimer {
        core.generation += 1;
        let generation = core.generation;
        let token = CancellationToken::new();
        let delay = match transition {
            HoverTransition::Expand => self.timings.open_delay(),
            HoverTransition::Collapse => self.timings.close_delay(),
        };
        let shared = Arc::clone(&self.core);
        let surface = Arc::clone(&self.surface);
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let mut core = shared.lock();
                    let slot = match transition {
                        HoverTransition::Expand => &mut core.timer_in,
                        HoverTransition::Collapse => &mut core.timer_out,
                    };
                    // A cancelled or superseded timer must not touch the tip.
                    if slot.as_ref().map(|t| t.generation) != Some(generation) {
                        return;
                    }
                    *slot = None;
                    if core.binding.is_none() {
                        return;
                    }
                    match transition {
                        HoverTransition::Expand => core.expand(surface.as_ref()),
                        HoverTransition::Collapse => core.collapse(surface.as_ref()),
                    }
                }
            }
        });
        PendingTimer { generation, token }
    }
}

impl Widget for Tip {
    fn mount(&mut self) -> Result<(), GuideError> {
        let mut core = self.core.lock();
        if core.binding.is_none() {
            return Err(TipError::Disposed.into());
        }
        core.reposition();
        core.mounted = true;
        self.surface.render(&core.frame);
        Ok(())
    }

    /// Cancel timers, drop listeners and take the bubble off the surface.
    /// Idempotent.
    fn dispose(&mut self) {
        let mut core = self.core.lock();
        if core.binding.is_none() {
            return;
        }
        core.cancel_timers();
        core.binding = None;
        if core.mounted {
            core.mounted = false;
            self.surface.remove(&self.id);
        }
        debug!(target: "tip", tip = %self.id, "tip disposed");
    }

    fn is_mounted(&self) -> bool {
        self.core.lock().mounted
    }
}

impl Drop for Tip {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn rendered_rect(node: &ElementNode) -> Result<Rect, TipError> {
    match node.rect {
        Some(rect) if !node.hidden => Ok(rect),
        _ => Err(TipError::AnchorLost(node.id.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemorySurface;
    use std::time::Duration;
    use tokio::time::sleep;
    use tourguide_core_types::StepPosition;
    use tourguide_dom::{DocumentSnapshot, ElementSpec};

    const VIEWPORT: Size = Size::new(1280.0, 800.0);

    fn node(spec: ElementSpec) -> ElementNode {
        let doc = DocumentSnapshot::from_tree("/", VIEWPORT, vec![spec]);
        doc.elements()[0].clone()
    }

    fn button(key: &str, rect: Rect) -> ElementNode {
        node(ElementSpec::new(key, "button").at(rect))
    }

    fn surface() -> Arc<MemorySurface> {
        Arc::new(MemorySurface::default().with_content_size(Size::new(240.0, 90.0)))
    }

    fn show(anchor: &ElementNode, surface: &Arc<MemorySurface>) -> Tip {
        let surface: Arc<dyn TipSurface> = surface.clone();
        Tip::show(
            anchor,
            VIEWPORT,
            TipInfo::default(),
            "Click here",
            surface,
            TipTimings::default(),
        )
        .unwrap()
    }

    fn enter(tip: &Tip, anchor: &ElementNode) -> TipReaction {
        tip.handle(&Interaction::on_element(anchor.id.clone(), InteractionKind::MouseEnter))
    }

    fn leave(tip: &Tip, anchor: &ElementNode) -> TipReaction {
        tip.handle(&Interaction::on_element(anchor.id.clone(), InteractionKind::MouseLeave))
    }

    #[tokio::test(start_paused = true)]
    async fn short_hover_never_expands() {
        let surface = surface();
        let anchor = button("a", Rect::new(100.0, 100.0, 80.0, 30.0));
        let tip = show(&anchor, &surface);
        let renders = surface.mutations();

        assert_eq!(enter(&tip, &anchor), TipReaction::Hover);
        sleep(Duration::from_millis(50)).await;
        leave(&tip, &anchor);
        sleep(Duration::from_millis(1_000)).await;

        assert!(!tip.is_opened());
        assert!(!tip.has_pending_timer());
        assert!(!surface.frame(tip.id()).unwrap().has_class("active"));
        assert_eq!(surface.mutations(), renders);
    }

    #[tokio::test(start_paused = true)]
    async fn long_hover_expands_to_content_size() {
        let surface = surface();
        let anchor = button("a", Rect::new(100.0, 100.0, 80.0, 30.0));
        let tip = show(&anchor, &surface);

        enter(&tip, &anchor);
        sleep(Duration::from_millis(150)).await;

        let frame = surface.frame(tip.id()).unwrap();
        assert!(tip.is_opened());
        assert!(frame.has_class("active"));
        assert_eq!(frame.rect.width, 240.0);
        assert_eq!(frame.rect.height, 90.0);
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_collapses_unless_reentered() {
        let surface = surface();
        let anchor = button("a", Rect::new(100.0, 100.0, 80.0, 30.0));
        let tip = show(&anchor, &surface);

        enter(&tip, &anchor);
        sleep(Duration::from_millis(150)).await;
        leave(&tip, &anchor);
        sleep(Duration::from_millis(100)).await;
        // back over the bubble before the collapse fires
        tip.handle(&Interaction::on_tip(tip.id().clone(), InteractionKind::MouseEnter));
        sleep(Duration::from_millis(500)).await;
        assert!(tip.is_opened());

        leave(&tip, &anchor);
        sleep(Duration::from_millis(350)).await;
        assert!(!tip.is_opened());
        let frame = surface.frame(tip.id()).unwrap();
        assert!(!frame.has_class("active"));
        assert_eq!(frame.rect.width, 28.0);
    }

    #[tokio::test]
    async fn consumption_is_a_one_shot_latch() {
        let surface = surface();
        let anchor = button("a", Rect::new(0.0, 0.0, 10.0, 10.0));
        let tip = show(&anchor, &surface);
        let click = Interaction::on_element(anchor.id.clone(), InteractionKind::MouseDown);

        assert_eq!(tip.handle(&click), TipReaction::Consumed);
        assert_eq!(tip.handle(&click), TipReaction::Ignored);
        assert!(tip.is_consumed());

        let elsewhere = Interaction::on_element(ElementId::new("b"), InteractionKind::MouseDown);
        assert_eq!(tip.handle(&elsewhere), TipReaction::Ignored);
    }

    #[tokio::test]
    async fn text_inputs_consume_on_change() {
        let surface = surface();
        let input = node(ElementSpec::new("name", "input"));
        let tip = show(&input, &surface);
        assert_eq!(tip.consume_on(), Some(InteractionKind::Change));

        let click = Interaction::on_element(input.id.clone(), InteractionKind::MouseDown);
        assert_eq!(tip.handle(&click), TipReaction::Ignored);
        let change = Interaction::on_element(input.id.clone(), InteractionKind::Change);
        assert_eq!(tip.handle(&change), TipReaction::Consumed);
    }

    #[tokio::test(start_paused = true)]
    async fn rebinding_keeps_consumption_and_pending_timer() {
        let surface = surface();
        let first = button("a", Rect::new(100.0, 100.0, 80.0, 30.0));
        let second = button("b", Rect::new(300.0, 100.0, 80.0, 30.0));
        let tip = show(&first, &surface);

        tip.handle(&Interaction::on_element(first.id.clone(), InteractionKind::MouseDown));
        enter(&tip, &first);
        sleep(Duration::from_millis(50)).await;

        assert!(tip.update(&second, VIEWPORT).unwrap());
        assert_eq!(tip.anchor(), Some(second.id.clone()));
        assert!(tip.is_consumed());
        assert!(tip.has_pending_timer());

        sleep(Duration::from_millis(60)).await;
        assert!(tip.is_opened());

        // old anchor no longer drives the tip
        let stale = Interaction::on_element(first.id.clone(), InteractionKind::MouseLeave);
        assert_eq!(tip.handle(&stale), TipReaction::Ignored);
        assert!(!tip.update(&second, VIEWPORT).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn opened_tips_are_not_repositioned() {
        let surface = surface();
        let anchor = button("a", Rect::new(100.0, 100.0, 80.0, 30.0));
        let tip = show(&anchor, &surface);
        enter(&tip, &anchor);
        sleep(Duration::from_millis(150)).await;
        let before = tip.frame().rect;

        let moved = button("a", Rect::new(600.0, 400.0, 80.0, 30.0));
        tip.update(&moved, VIEWPORT).unwrap();
        assert_eq!(tip.frame().rect, before);
    }

    #[tokio::test]
    async fn closed_tips_follow_their_anchor() {
        let surface = surface();
        let anchor = button("a", Rect::new(100.0, 100.0, 80.0, 30.0));
        let tip = show(&anchor, &surface);
        let moved = button("a", Rect::new(600.0, 400.0, 80.0, 30.0));
        tip.update(&moved, VIEWPORT).unwrap();
        assert_eq!(tip.frame().rect.x, 690.0);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_timers_and_detaches() {
        let surface = surface();
        let anchor = button("a", Rect::new(100.0, 100.0, 80.0, 30.0));
        let mut tip = show(&anchor, &surface);
        enter(&tip, &anchor);
        tip.dispose();
        let after_dispose = surface.mutations();

        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(surface.mutations(), after_dispose);
        assert!(surface.frame(tip.id()).is_none());
        assert!(!tip.is_mounted());
        assert_eq!(
            tip.handle(&Interaction::on_element(anchor.id.clone(), InteractionKind::MouseDown)),
            TipReaction::Ignored
        );
        assert_eq!(tip.update(&anchor, VIEWPORT), Err(TipError::Disposed));
    }

    #[tokio::test]
    async fn detached_anchors_are_reported_as_lost() {
        let surface: Arc<dyn TipSurface> = surface();
        let detached = node(ElementSpec::new("gone", "a").detached());
        let err = Tip::show(
            &detached,
            VIEWPORT,
            TipInfo::default().with_position(StepPosition::Top),
            "",
            surface,
            TipTimings::default(),
        )
        .err();
        assert_eq!(err, Some(TipError::AnchorLost(ElementId::new("gone"))));
    }

    #[tokio::test]
    async fn update_to_hidden_anchor_is_lost() {
        let surface = surface();
        let anchor = button("a", Rect::new(100.0, 100.0, 80.0, 30.0));
        let tip = show(&anchor, &surface);
        let hidden = node(ElementSpec::new("a", "button").hidden());
        assert_eq!(
            tip.update(&hidden, VIEWPORT),
            Err(TipError::AnchorLost(ElementId::new("a")))
        );
        assert_eq!(tip.anchor(), Some(anchor.id.clone()));
    }
}
