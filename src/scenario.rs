//! Scripted simulations.
//!
//! A scenario replays a timeline of document frames and user interactions
//! against one tour and records the events the runner publishes:
//!
//! ```yaml
//! tour: question
//! duration_ms: 3000
//! frames:
//!   - at_ms: 0
//!     elements:
//!       - { key: new, tag: a, attrs: { data-action: new_forum } }
//! interactions:
//!   - { at_ms: 800, element: new, kind: mousedown }
//!   - { at_ms: 900, kind: mouseenter }   # no element: the visible tip
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use tourguide_core_types::{ElementId, GuideError};
use tourguide_dom::{DocumentSnapshot, ElementSpec, Size};
use tourguide_event_bus::to_mpsc;
use tourguide_registry::Registry;
use tourguide_runner::{DocumentSource, RunPhase, RunnerConfig, TourEvent, TourRunner};
use tourguide_tip::{Interaction, InteractionKind, MemorySurface};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid scenario: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("scenario names no tour and no tour matches {0}")]
    NothingToRun(String),
    #[error("scenario has no frames")]
    NoFrames,
    #[error(transparent)]
    Runner(#[from] tourguide_runner::RunnerError),
}

impl From<ScenarioError> for GuideError {
    fn from(err: ScenarioError) -> Self {
        GuideError::new(err.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub at_ms: u64,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptedInteraction {
    pub at_ms: u64,
    /// Element key; absent means the hint bubble currently shown.
    #[serde(default)]
    pub element: Option<String>,
    pub kind: InteractionKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    /// Tour to start. When absent, tours bound to `url` are auto-started.
    #[serde(default)]
    pub tour: Option<String>,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_viewport")]
    pub viewport: Size,
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub interactions: Vec<ScriptedInteraction>,
    /// Total simulated time; defaults to one second past the last entry.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

fn default_url() -> String {
    "/".to_string()
}

fn default_viewport() -> Size {
    Size::new(1280.0, 800.0)
}

impl Scenario {
    pub fn from_yaml(source: &str) -> Result<Self, ScenarioError> {
        let mut scenario: Scenario = serde_yaml::from_str(source)?;
        if scenario.frames.is_empty() {
            return Err(ScenarioError::NoFrames);
        }
        scenario.frames.sort_by_key(|frame| frame.at_ms);
        scenario.interactions.sort_by_key(|step| step.at_ms);
        Ok(scenario)
    }

    pub fn duration(&self) -> Duration {
        let last = self
            .frames
            .iter()
            .map(|frame| frame.at_ms)
            .chain(self.interactions.iter().map(|step| step.at_ms))
            .max()
            .unwrap_or(0);
        Duration::from_millis(self.duration_ms.unwrap_or(last + 1_000))
    }
}

/// Document source that plays back scenario frames against the clock.
pub struct ScriptedDocument {
    started: Instant,
    frames: Vec<(Duration, DocumentSnapshot)>,
}

impl ScriptedDocument {
    pub fn new(scenario: &Scenario, started: Instant) -> Self {
        let frames = scenario
            .frames
            .iter()
            .map(|frame| {
                (
                    Duration::from_millis(frame.at_ms),
                    DocumentSnapshot::from_tree(
                        scenario.url.clone(),
                        scenario.viewport,
                        frame.elements.clone(),
                    ),
                )
            })
            .collect();
        Self { started, frames }
    }

    /// Latest frame due at `elapsed`.
    pub fn frame_at(&self, elapsed: Duration) -> Option<&DocumentSnapshot> {
        self.frames
            .iter()
            .take_while(|(at, _)| *at <= elapsed)
            .last()
            .map(|(_, doc)| doc)
    }
}

#[async_trait]
impl DocumentSource for ScriptedDocument {
    async fn snapshot(&self) -> Result<DocumentSnapshot, GuideError> {
        self.frame_at(self.started.elapsed())
            .cloned()
            .ok_or_else(|| GuideError::new("no frame rendered yet"))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: TourEvent,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub tours: Vec<String>,
    pub events: Vec<TimedEvent>,
    pub phases: Vec<(String, RunPhase)>,
    pub surface_mutations: usize,
}

impl SimulationReport {
    pub fn completed(&self, tour: &str) -> bool {
        self.phases
            .iter()
            .any(|(name, phase)| name == tour && *phase == RunPhase::Completed)
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(|timed| timed.event.kind()).collect()
    }
}

/// Play `scenario` against tours in `registry` and collect what happened.
pub async fn simulate(
    scenario: &Scenario,
    registry: Arc<dyn Registry>,
    config: RunnerConfig,
) -> Result<SimulationReport, ScenarioError> {
    let started = Instant::now();
    let document = Arc::new(ScriptedDocument::new(scenario, started));
    let surface = Arc::new(MemorySurface::default());
    let runner = TourRunner::builder(registry, document, surface.clone())
        .config(config)
        .build();

    let events = to_mpsc(&runner.bus(), runner.config().bus_capacity);
    let collector = tokio::spawn(collect_events(events, started));

    let tours = match scenario.tour.as_deref() {
        Some(name) => {
            runner.start_tour(name)?;
            vec![name.to_string()]
        }
        None => {
            if runner.autostart(&scenario.url).is_empty() {
                collector.abort();
                return Err(ScenarioError::NothingToRun(scenario.url.clone()));
            }
            runner.active_tours()
        }
    };
    info!(tours = ?tours, "simulation started");

    for step in &scenario.interactions {
        sleep_until(started + Duration::from_millis(step.at_ms)).await;
        let targets: Vec<Interaction> = match &step.element {
            Some(key) => vec![Interaction::on_element(ElementId::new(key.as_str()), step.kind)],
            None => tours
                .iter()
                .filter_map(|tour| runner.current_tip(tour))
                .map(|tip| Interaction::on_tip(tip, step.kind))
                .collect(),
        };
        if targets.is_empty() {
            debug!(at_ms = step.at_ms, "no visible tip to interact with");
        }
        for interaction in &targets {
            runner.dispatch(interaction);
        }
    }

    sleep_until(started + scenario.duration()).await;
    let phases = tours
        .iter()
        .map(|tour| (tour.clone(), runner.phase(tour)))
        .collect();
    runner.shutdown().await;
    // Dropping the runner closes the bus, which ends the collector once it
    // has drained what was published.
    drop(runner);
    let events = match collector.await {
        Ok(events) => events,
        Err(err) => {
            warn!(error = %err, "event collector failed");
            Vec::new()
        }
    };

    Ok(SimulationReport {
        tours,
        events,
        phases,
        surface_mutations: surface.mutations(),
    })
}

async fn collect_events(mut rx: mpsc::Receiver<TourEvent>, started: Instant) -> Vec<TimedEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(TimedEvent {
            at_ms: started.elapsed().as_millis() as u64,
            event,
        });
    }
    events
}
