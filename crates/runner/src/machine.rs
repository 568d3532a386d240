//! Per-run step state machine.
//!
//! A [`TourRun`] is driven from two sides: poll ticks feed it fresh document
//! snapshots, and dispatched interactions reach the visible tip. Both are
//! synchronous; the events each transition produces queue up in the run and
//! are drained by the caller while it still holds the run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use tourguide_core_types::{GuideError, Predicate, RunId, Widget};
use tourguide_dom::{DocumentSnapshot, ElementNode, MatchSet, PredicateEvaluator, Size};
use tourguide_registry::{TourDefinition, TourStep};
use tourguide_tip::{Interaction, Tip, TipInfo, TipReaction, TipSurface, TipTimings};

use crate::metrics;
use crate::model::{RunPhase, TourEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Stopped,
    Skipped,
}

pub struct TourRun {
    id: RunId,
    definition: Arc<TourDefinition>,
    surface: Arc<dyn TipSurface>,
    timings: TipTimings,
    index: usize,
    phase: RunPhase,
    tip: Option<Tip>,
    warned_step: Option<usize>,
    outbox: Vec<TourEvent>,
}

impl TourRun {
    pub fn new(
        definition: Arc<TourDefinition>,
        surface: Arc<dyn TipSurface>,
        timings: TipTimings,
    ) -> Self {
        Self {
            id: RunId::new(),
            definition,
            surface,
            timings,
            index: 0,
            phase: RunPhase::Idle,
            tip: None,
            warned_step: None,
            outbox: Vec::new(),
        }
    }

    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &Arc<TourDefinition> {
        &self.definition
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn step_index(&self) -> usize {
        self.index
    }

    pub fn tip(&self) -> Option<&Tip> {
        self.tip.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<TourEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// `Idle -> WaitingForTrigger`, or straight to `Completed` for a tour
    /// without steps. No-op on a run that already began.
    pub fn begin(&mut self) {
        if self.phase != RunPhase::Idle {
            return;
        }
        self.index = 0;
        self.phase = RunPhase::WaitingForTrigger;
        metrics::record_run_started(self.name());
        info!(
            target: "tour",
            tour = %self.definition.name,
            run = %self.id,
            steps = self.definition.len(),
            "tour started"
        );
        self.outbox.push(TourEvent::TourStarted {
            run: self.id.clone(),
            tour: self.definition.name.clone(),
            steps: self.definition.len(),
        });
        if self.definition.is_empty() {
            self.complete();
        }
    }

    /// Re-evaluate the current step against `doc`.
    pub fn tick(&mut self, doc: &DocumentSnapshot, evaluator: &dyn PredicateEvaluator) {
        if !self.phase.is_running() {
            return;
        }
        let definition = Arc::clone(&self.definition);
        let Some(step) = definition.step(self.index) else {
            return;
        };
        match self.resolve_anchor(doc, evaluator, step) {
            Some(anchor) => self.present(anchor, doc.viewport(), step),
            None => self.hide(),
        }
    }

    /// Route a host interaction to the visible tip, advancing on consumption.
    pub fn interact(&mut self, interaction: &Interaction) -> TipReaction {
        if self.phase != RunPhase::HintVisible {
            return TipReaction::Ignored;
        }
        let Some(tip) = self.tip.as_ref() else {
            return TipReaction::Ignored;
        };
        let reaction = tip.handle(interaction);
        if reaction == TipReaction::Consumed {
            self.advance();
        }
        reaction
    }

    /// Tear the run down to `Idle`. Returns whether it was still running;
    /// only then is a stop or skip event queued.
    pub fn stop(&mut self, reason: StopReason) -> bool {
        let was_running = self.phase.is_running();
        if let Some(mut tip) = self.tip.take() {
            tip.dispose();
        }
        self.phase = RunPhase::Idle;
        if !was_running {
            return false;
        }
        let run = self.id.clone();
        let tour = self.definition.name.clone();
        let step = self.index;
        match reason {
            StopReason::Stopped => {
                metrics::record_run_stopped(&tour);
                info!(target: "tour", tour = %tour, step, "tour stopped");
                self.outbox.push(TourEvent::TourStopped { run, tour, step });
            }
            StopReason::Skipped => {
                metrics::record_run_skipped(&tour);
                info!(target: "tour", tour = %tour, step, "tour skipped");
                self.outbox.push(TourEvent::TourSkipped { run, tour, step });
            }
        }
        true
    }

    fn resolve_anchor<'d>(
        &mut self,
        doc: &'d DocumentSnapshot,
        evaluator: &dyn PredicateEvaluator,
        step: &TourStep,
    ) -> Option<&'d ElementNode> {
        let matches = self.evaluate(doc, evaluator, &step.trigger)?;
        if let Some(extra) = &step.extra_trigger {
            self.evaluate(doc, evaluator, extra)?;
        }
        matches.first().and_then(|id| doc.element(id))
    }

    fn evaluate(
        &mut self,
        doc: &DocumentSnapshot,
        evaluator: &dyn PredicateEvaluator,
        predicate: &Predicate,
    ) -> Option<MatchSet> {
        match evaluator.evaluate(doc, predicate) {
            Ok(matches) if matches.is_satisfied() => Some(matches),
            Ok(_) => None,
            Err(err) => {
                if self.warned_step != Some(self.index) {
                    self.warned_step = Some(self.index);
                    metrics::record_predicate_error(self.name());
                    warn!(
                        target: "tour",
                        tour = %self.definition.name,
                        step = self.index,
                        predicate = %predicate,
                        error = %err,
                        "predicate cannot be evaluated; step stays pending"
                    );
                }
                None
            }
        }
    }

    fn present(&mut self, anchor: &ElementNode, viewport: Size, step: &TourStep) {
        if let Some(tip) = self.tip.as_ref() {
            match tip.update(anchor, viewport) {
                Ok(true) => {
                    debug!(target: "tour", tour = %self.definition.name, anchor = %anchor.id, "hint rebound")
                }
                Ok(false) => {}
                Err(err) => {
                    debug!(target: "tour", tour = %self.definition.name, error = %err, "hint anchor lost");
                    self.hide();
                }
            }
            return;
        }
        let info = TipInfo::default()
            .with_position(step.position)
            .with_width(step.width);
        match Tip::show(
            anchor,
            viewport,
            info,
            step.content.clone(),
            Arc::clone(&self.surface),
            self.timings,
        ) {
            Ok(tip) => {
                metrics::record_hint_shown(self.name());
                info!(
                    target: "tour",
                    tour = %self.definition.name,
                    step = self.index,
                    anchor = %anchor.id,
                    "hint shown"
                );
                self.outbox.push(TourEvent::HintShown {
                    run: self.id.clone(),
                    tour: self.definition.name.clone(),
                    step: self.index,
                    tip: tip.id().clone(),
                    anchor: anchor.id.clone(),
                });
                self.tip = Some(tip);
                self.phase = RunPhase::HintVisible;
            }
            Err(err) => {
                debug!(target: "tour", tour = %self.definition.name, error = %err, "anchor not rendered yet")
            }
        }
    }

    fn hide(&mut self) {
        let Some(mut tip) = self.tip.take() else {
            return;
        };
        tip.dispose();
        self.phase = RunPhase::WaitingForTrigger;
        debug!(target: "tour", tour = %self.definition.name, step = self.index, "hint hidden");
        self.outbox.push(TourEvent::HintHidden {
            run: self.id.clone(),
            tour: self.definition.name.clone(),
            step: self.index,
            tip: tip.id().clone(),
        });
    }

    fn advance(&mut self) {
        let Some(mut tip) = self.tip.take() else {
            return;
        };
        tip.dispose();
        let tour = self.definition.name.clone();
        self.outbox.push(TourEvent::TipConsumed {
            run: self.id.clone(),
            tour: tour.clone(),
            step: self.index,
            tip: tip.id().clone(),
        });
        self.index = (self.index + 1).min(self.definition.len());
        metrics::record_step_advanced(&tour);
        info!(target: "tour", tour = %tour, step = self.index, "step advanced");
        self.outbox.push(TourEvent::StepAdvanced {
            run: self.id.clone(),
            tour,
            step: self.index,
        });
        if self.index >= self.definition.len() {
            self.complete();
        } else {
            self.phase = RunPhase::WaitingForTrigger;
        }
    }

    fn complete(&mut self) {
        self.phase = RunPhase::Completed;
        metrics::record_run_completed(self.name());
        info!(target: "tour", tour = %self.definition.name, run = %self.id, "tour completed");
        self.outbox.push(TourEvent::TourCompleted {
            run: self.id.clone(),
            tour: self.definition.name.clone(),
        });
    }
}

impl Widget for TourRun {
    fn mount(&mut self) -> Result<(), GuideError> {
        if self.phase != RunPhase::Idle {
            return Err(GuideError::new(format!(
                "tour {} is already running",
                self.definition.name
            )));
        }
        self.begin();
        Ok(())
    }

    fn dispose(&mut self) {
        self.stop(StopReason::Stopped);
    }

    fn is_mounted(&self) -> bool {
        self.phase != RunPhase::Idle
    }
}
