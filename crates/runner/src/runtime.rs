use std::sync::Arc;
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use tourguide_core_types::{RunId, TipId};
use tourguide_dom::{PredicateEvaluator, SelectorEvaluator};
use tourguide_event_bus::{EventBus, InMemoryBus};
use tourguide_registry::Registry;
use tourguide_tip::{Interaction, TipReaction, TipSurface};

use crate::error::RunnerError;
use crate::machine::{StopReason, TourRun};
use crate::model::{RunPhase, RunnerConfig, TourEvent};
use crate::ports::DocumentSource;

struct ActiveRun {
    state: Arc<Mutex<TourRun>>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

/// Drives registered tours against the host document.
///
/// Every started tour gets its own poll task; `dispatch` feeds interactions
/// to all runs. Events are published while the run is locked, so a
/// subscriber sees each run's events in transition order.
pub struct TourRunner {
    registry: Arc<dyn Registry>,
    documents: Arc<dyn DocumentSource>,
    evaluator: Arc<dyn PredicateEvaluator>,
    surface: Arc<dyn TipSurface>,
    bus: Arc<InMemoryBus<TourEvent>>,
    config: RunnerConfig,
    runs: DashMap<String, ActiveRun>,
    // Every tour started by this runner, whatever became of the run.
    launched: DashSet<String>,
}

pub struct TourRunnerBuilder {
    registry: Arc<dyn Registry>,
    documents: Arc<dyn DocumentSource>,
    surface: Arc<dyn TipSurface>,
    evaluator: Option<Arc<dyn PredicateEvaluator>>,
    bus: Option<Arc<InMemoryBus<TourEvent>>>,
    config: RunnerConfig,
}

impl TourRunnerBuilder {
    pub fn evaluator(mut self, evaluator: Arc<dyn PredicateEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn bus(mut self, bus: Arc<InMemoryBus<TourEvent>>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TourRunner {
        let bus = self
            .bus
            .unwrap_or_else(|| InMemoryBus::new(self.config.bus_capacity));
        let evaluator = self
            .evaluator
            .unwrap_or_else(|| Arc::new(SelectorEvaluator::new()));
        TourRunner {
            registry: self.registry,
            documents: self.documents,
            evaluator,
            surface: self.surface,
            bus,
            config: self.config,
            runs: DashMap::new(),
            launched: DashSet::new(),
        }
    }
}

impl TourRunner {
    pub fn builder(
        registry: Arc<dyn Registry>,
        documents: Arc<dyn DocumentSource>,
        surface: Arc<dyn TipSurface>,
    ) -> TourRunnerBuilder {
        TourRunnerBuilder {
            registry,
            documents,
            surface,
            evaluator: None,
            bus: None,
            config: RunnerConfig::default(),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn bus(&self) -> Arc<InMemoryBus<TourEvent>> {
        Arc::clone(&self.bus)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TourEvent> {
        self.bus.subscribe()
    }

    /// Start `name` from its first step. A run already in progress for the
    /// same tour is stopped and replaced.
    pub fn start_tour(&self, name: &str) -> Result<RunId, RunnerError> {
        let definition = self.registry.get(name)?;
        if let Some((_, previous)) = self.runs.remove(name) {
            debug!(target: "tour", tour = name, "restarting tour");
            self.retire(previous, StopReason::Stopped);
        }

        let mut run = TourRun::new(definition, Arc::clone(&self.surface), self.config.tip);
        run.begin();
        let id = run.id().clone();
        let running = run.phase().is_running();
        let state = Arc::new(Mutex::new(run));
        publish(&self.bus, &mut state.lock());

        let cancel = CancellationToken::new();
        let worker = running.then(|| {
            tokio::spawn(poll_loop(
                name.to_string(),
                Arc::clone(&state),
                Arc::clone(&self.documents),
                Arc::clone(&self.evaluator),
                Arc::clone(&self.bus),
                cancel.clone(),
                self.config.poll_interval(),
            ))
        });
        self.launched.insert(name.to_string());
        self.runs.insert(
            name.to_string(),
            ActiveRun {
                state,
                cancel,
                worker,
            },
        );
        Ok(id)
    }

    /// Stop `name`. `Ok(false)` when the tour is known but was not running.
    pub fn stop_tour(&self, name: &str) -> Result<bool, RunnerError> {
        match self.runs.remove(name) {
            Some((_, active)) => Ok(self.retire(active, StopReason::Stopped)),
            None if self.registry.contains(name) => Ok(false),
            None => Err(RunnerError::NotFound(name.to_string())),
        }
    }

    /// Abandon `name` on the user's behalf. Only tours registered with
    /// `skip_enabled` may be skipped.
    pub fn skip_tour(&self, name: &str) -> Result<bool, RunnerError> {
        let running = self
            .runs
            .get(name)
            .map(|active| active.state.lock().definition().options.skip_enabled);
        let skip_enabled = match running {
            Some(enabled) => enabled,
            None => self.registry.get(name)?.options.skip_enabled,
        };
        if !skip_enabled {
            return Err(RunnerError::SkipDisabled(name.to_string()));
        }
        match self.runs.remove(name) {
            Some((_, active)) => Ok(self.retire(active, StopReason::Skipped)),
            None => Ok(false),
        }
    }

    /// Start every tour bound to `url` that this runner never started. A tour
    /// that already ran is left alone however it ended. Does nothing when
    /// auto-run is off.
    pub fn autostart(&self, url: &str) -> Vec<RunId> {
        if !self.config.auto_run {
            debug!(target: "tour", url, "auto-run disabled");
            return Vec::new();
        }
        let mut started = Vec::new();
        for definition in self.registry.matching_url(url) {
            if self.launched.contains(&definition.name) {
                continue;
            }
            match self.start_tour(&definition.name) {
                Ok(id) => started.push(id),
                Err(err) => warn!(target: "tour", tour = %definition.name, error = %err, "autostart failed"),
            }
        }
        started
    }

    /// Deliver a host interaction to every run. Returns how many tips it
    /// consumed.
    pub fn dispatch(&self, interaction: &Interaction) -> usize {
        let mut consumed = 0;
        for active in self.runs.iter() {
            let mut run = active.state.lock();
            if run.interact(interaction) == TipReaction::Consumed {
                consumed += 1;
            }
            publish(&self.bus, &mut run);
            if run.phase() == RunPhase::Completed {
                active.cancel.cancel();
            }
        }
        consumed
    }

    pub fn phase(&self, name: &str) -> RunPhase {
        self.runs
            .get(name)
            .map(|active| active.state.lock().phase())
            .unwrap_or_default()
    }

    pub fn step_index(&self, name: &str) -> Option<usize> {
        self.runs
            .get(name)
            .map(|active| active.state.lock().step_index())
    }

    pub fn current_tip(&self, name: &str) -> Option<TipId> {
        self.runs
            .get(name)
            .and_then(|active| active.state.lock().tip().map(|tip| tip.id().clone()))
    }

    /// Names of tours still waiting or showing a hint, sorted.
    pub fn active_tours(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .runs
            .iter()
            .filter(|active| active.state.lock().phase().is_running())
            .map(|active| active.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Stop every run and wait for the poll tasks to wind down.
    pub async fn shutdown(&self) {
        let names: Vec<String> = self.runs.iter().map(|active| active.key().clone()).collect();
        let mut workers = Vec::new();
        for name in names {
            if let Some((_, mut active)) = self.runs.remove(&name) {
                workers.extend(active.worker.take());
                self.retire(active, StopReason::Stopped);
            }
        }
        for worker in workers {
            if let Err(err) = worker.await {
                warn!(target: "tour", error = %err, "poll task ended abnormally");
            }
        }
    }

    fn retire(&self, active: ActiveRun, reason: StopReason) -> bool {
        active.cancel.cancel();
        let mut run = active.state.lock();
        let was_running = run.stop(reason);
        publish(&self.bus, &mut run);
        was_running
    }
}

impl Drop for TourRunner {
    fn drop(&mut self) {
        for active in self.runs.iter() {
            active.cancel.cancel();
        }
    }
}

fn publish(bus: &InMemoryBus<TourEvent>, run: &mut TourRun) {
    for event in run.drain_events() {
        trace!(target: "tour", event = event.kind(), tour = event.tour(), "publishing");
        bus.emit(event);
    }
}

async fn poll_loop(
    name: String,
    state: Arc<Mutex<TourRun>>,
    documents: Arc<dyn DocumentSource>,
    evaluator: Arc<dyn PredicateEvaluator>,
    bus: Arc<InMemoryBus<TourEvent>>,
    cancel: CancellationToken,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let snapshot = tokio::select! {
            _ = cancel.cancelled() => break,
            snapshot = documents.snapshot() => snapshot,
        };
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(target: "tour", tour = %name, error = %err, "document unavailable, skipping tick");
                continue;
            }
        };
        let finished = {
            let mut run = state.lock();
            if cancel.is_cancelled() || !run.phase().is_running() {
                true
            } else {
                run.tick(&snapshot, evaluator.as_ref());
                publish(&bus, &mut run);
                !run.phase().is_running()
            }
        };
        if finished {
            break;
        }
    }
    trace!(target: "tour", tour = %name, "poll loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SharedDocument;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time::sleep;
    use tourguide_core_types::ElementId;
    use tourguide_dom::{DocumentSnapshot, ElementSpec, Rect, Size};
    use tourguide_registry::{RegistryImpl, TourOptions, TourStep};
    use tourguide_tip::{InteractionKind, MemorySurface};

    const VIEWPORT: Size = Size::new(1280.0, 800.0);

    struct Harness {
        registry: Arc<RegistryImpl>,
        document: Arc<SharedDocument>,
        surface: Arc<MemorySurface>,
        runner: TourRunner,
    }

    fn harness(config: RunnerConfig) -> Harness {
        let registry = Arc::new(RegistryImpl::new());
        let document = Arc::new(SharedDocument::new(DocumentSnapshot::empty("/", VIEWPORT)));
        let surface = Arc::new(MemorySurface::default());
        let runner = TourRunner::builder(registry.clone(), document.clone(), surface.clone())
            .config(config)
            .build();
        Harness {
            registry,
            document,
            surface,
            runner,
        }
    }

    /// Buttons stacked vertically; the ones listed in `done` carry class `done`.
    fn page(ids: &[&str], done: &[&str]) -> DocumentSnapshot {
        let roots = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let spec = ElementSpec::new(*id, "button")
                    .with_id(*id)
                    .at(Rect::new(10.0, 10.0 + 50.0 * i as f64, 80.0, 30.0));
                if done.contains(id) {
                    spec.with_class("done")
                } else {
                    spec
                }
            })
            .collect();
        DocumentSnapshot::from_tree("/", VIEWPORT, roots)
    }

    fn mousedown(key: &str) -> Interaction {
        Interaction::on_element(ElementId::new(key), InteractionKind::MouseDown)
    }

    fn drain(rx: &mut broadcast::Receiver<TourEvent>) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind());
        }
        kinds
    }

    #[tokio::test(start_paused = true)]
    async fn tour_follows_document_changes() {
        let h = harness(RunnerConfig::default());
        h.registry
            .register(
                "demo",
                TourOptions::default(),
                vec![
                    TourStep::new("#a"),
                    TourStep::new("#b").with_extra_trigger("#a.done"),
                ],
            )
            .unwrap();
        let mut rx = h.runner.subscribe();
        h.document.set(page(&["a", "b"], &[]));

        h.runner.start_tour("demo").unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(h.runner.phase("demo"), RunPhase::HintVisible);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(h.runner.step_index("demo"), Some(0));

        assert_eq!(h.runner.dispatch(&mousedown("a")), 1);
        assert_eq!(h.runner.step_index("demo"), Some(1));
        sleep(Duration::from_secs(2)).await;
        assert_eq!(h.runner.phase("demo"), RunPhase::WaitingForTrigger);

        h.document.set(page(&["a", "b"], &["a"]));
        sleep(Duration::from_millis(600)).await;
        assert_eq!(h.runner.phase("demo"), RunPhase::HintVisible);

        h.runner.dispatch(&mousedown("b"));
        assert_eq!(h.runner.phase("demo"), RunPhase::Completed);
        assert!(h.runner.active_tours().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![
                "tour_started",
                "hint_shown",
                "tip_consumed",
                "step_advanced",
                "hint_shown",
                "tip_consumed",
                "step_advanced",
                "tour_completed",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_tours_leave_no_trace() {
        let h = harness(RunnerConfig::default());
        let mut rx = h.runner.subscribe();
        assert_eq!(
            h.runner.start_tour("missing"),
            Err(RunnerError::NotFound("missing".into()))
        );
        assert_eq!(h.runner.phase("missing"), RunPhase::Idle);
        assert_eq!(h.runner.step_index("missing"), None);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(
            h.runner.stop_tour("missing"),
            Err(RunnerError::NotFound("missing".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn latest_registration_is_used() {
        let h = harness(RunnerConfig::default());
        h.registry
            .register("x", TourOptions::default(), vec![TourStep::new("#a")])
            .unwrap();
        h.registry
            .register("x", TourOptions::default(), vec![TourStep::new("#b")])
            .unwrap();
        h.document.set(page(&["a", "b"], &[]));

        h.runner.start_tour("x").unwrap();
        sleep(Duration::from_millis(10)).await;
        let frames = h.surface.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].anchor, ElementId::new("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_tours_stay_quiet() {
        let h = harness(RunnerConfig::default());
        h.registry
            .register("demo", TourOptions::default(), vec![TourStep::new("#a")])
            .unwrap();
        h.document.set(page(&["a"], &[]));
        h.runner.start_tour("demo").unwrap();
        sleep(Duration::from_millis(10)).await;
        let tip = h.runner.current_tip("demo").unwrap();
        h.runner
            .dispatch(&Interaction::on_tip(tip, InteractionKind::MouseEnter));

        assert_eq!(h.runner.stop_tour("demo"), Ok(true));
        let mutations = h.surface.mutations();
        assert_eq!(h.surface.visible(), 0);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(h.runner.dispatch(&mousedown("a")), 0);
        assert_eq!(h.surface.mutations(), mutations);
        assert_eq!(h.runner.phase("demo"), RunPhase::Idle);
        assert_eq!(h.runner.stop_tour("demo"), Ok(false));
    }

    #[tokio::test(start_paused = true)]
    async fn starting_again_restarts_from_the_first_step() {
        let h = harness(RunnerConfig::default());
        h.registry
            .register(
                "demo",
                TourOptions::default(),
                vec![TourStep::new("#a"), TourStep::new("#b")],
            )
            .unwrap();
        h.document.set(page(&["a", "b"], &[]));
        let first = h.runner.start_tour("demo").unwrap();
        sleep(Duration::from_millis(10)).await;
        h.runner.dispatch(&mousedown("a"));
        assert_eq!(h.runner.step_index("demo"), Some(1));

        let mut rx = h.runner.subscribe();
        let second = h.runner.start_tour("demo").unwrap();
        assert_ne!(first, second);
        assert_eq!(h.runner.step_index("demo"), Some(0));
        assert_eq!(drain(&mut rx), vec!["tour_stopped", "tour_started"]);
    }

    #[tokio::test]
    async fn skipping_requires_permission() {
        let h = harness(RunnerConfig::default());
        h.registry
            .register("locked", TourOptions::default(), vec![TourStep::new("#a")])
            .unwrap();
        h.registry
            .register("open", TourOptions::new(true, ""), vec![TourStep::new("#a")])
            .unwrap();
        h.runner.start_tour("locked").unwrap();
        h.runner.start_tour("open").unwrap();
        let mut rx = h.runner.subscribe();

        assert_eq!(
            h.runner.skip_tour("locked"),
            Err(RunnerError::SkipDisabled("locked".into()))
        );
        assert_eq!(h.runner.phase("locked"), RunPhase::WaitingForTrigger);
        assert_eq!(h.runner.skip_tour("open"), Ok(true));
        assert_eq!(h.runner.phase("open"), RunPhase::Idle);
        assert_eq!(drain(&mut rx), vec!["tour_skipped"]);
        h.runner.shutdown().await;
    }

    #[tokio::test]
    async fn autostart_honours_url_and_policy() {
        let h = harness(RunnerConfig::default());
        h.registry
            .register("forum", TourOptions::new(false, "/forum"), vec![TourStep::new("#a")])
            .unwrap();
        h.registry
            .register("shop", TourOptions::new(false, "/shop"), vec![TourStep::new("#a")])
            .unwrap();

        assert_eq!(h.runner.autostart("/forum?page=2").len(), 1);
        assert_eq!(h.runner.active_tours(), vec!["forum".to_string()]);
        assert!(h.runner.autostart("/forum").is_empty());

        let off = harness(RunnerConfig {
            auto_run: false,
            ..RunnerConfig::default()
        });
        off.registry
            .register("forum", TourOptions::new(false, "/forum"), vec![TourStep::new("#a")])
            .unwrap();
        assert!(off.runner.autostart("/forum").is_empty());
        h.runner.shutdown().await;
    }

    #[tokio::test]
    async fn autostart_leaves_stopped_and_skipped_tours_alone() {
        let h = harness(RunnerConfig::default());
        h.registry
            .register("forum", TourOptions::new(false, "/forum"), vec![TourStep::new("#a")])
            .unwrap();
        h.registry
            .register("help", TourOptions::new(true, "/forum"), vec![TourStep::new("#a")])
            .unwrap();
        assert_eq!(h.runner.autostart("/forum").len(), 2);

        assert_eq!(h.runner.stop_tour("forum"), Ok(true));
        assert_eq!(h.runner.skip_tour("help"), Ok(true));
        assert!(h.runner.autostart("/forum").is_empty());
        assert!(h.runner.active_tours().is_empty());

        h.runner.start_tour("forum").unwrap();
        assert_eq!(h.runner.active_tours(), vec!["forum".to_string()]);
        h.runner.shutdown().await;
    }

    #[tokio::test]
    async fn empty_tours_complete_without_polling() {
        let h = harness(RunnerConfig::default());
        h.registry
            .register("empty", TourOptions::default(), Vec::new())
            .unwrap();
        let mut rx = h.runner.subscribe();
        h.runner.start_tour("empty").unwrap();
        assert_eq!(h.runner.phase("empty"), RunPhase::Completed);
        assert_eq!(drain(&mut rx), vec!["tour_started", "tour_completed"]);
    }
}
