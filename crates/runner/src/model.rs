use std::time::Duration;

use serde::{Deserialize, Serialize};
use tourguide_core_types::{ElementId, RunId, TipId};
use tourguide_tip::TipTimings;

/// Runner settings. `auto_run` gates [`crate::TourRunner::autostart`] only;
/// explicit starts always go through.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub poll_interval_ms: u64,
    pub auto_run: bool,
    pub bus_capacity: usize,
    pub tip: TipTimings,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            auto_run: true,
            bus_capacity: 256,
            tip: TipTimings::default(),
        }
    }
}

impl RunnerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    WaitingForTrigger,
    HintVisible,
    Completed,
}

impl RunPhase {
    /// Whether the poll loop still has work to do.
    pub fn is_running(self) -> bool {
        matches!(self, RunPhase::WaitingForTrigger | RunPhase::HintVisible)
    }
}

/// Lifecycle notifications published on the runner's bus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TourEvent {
    TourStarted {
        run: RunId,
        tour: String,
        steps: usize,
    },
    HintShown {
        run: RunId,
        tour: String,
        step: usize,
        tip: TipId,
        anchor: ElementId,
    },
    HintHidden {
        run: RunId,
        tour: String,
        step: usize,
        tip: TipId,
    },
    TipConsumed {
        run: RunId,
        tour: String,
        step: usize,
        tip: TipId,
    },
    /// `step` is the index the run moved to.
    StepAdvanced {
        run: RunId,
        tour: String,
        step: usize,
    },
    TourCompleted {
        run: RunId,
        tour: String,
    },
    TourStopped {
        run: RunId,
        tour: String,
        step: usize,
    },
    TourSkipped {
        run: RunId,
        tour: String,
        step: usize,
    },
}

impl TourEvent {
    pub fn tour(&self) -> &str {
        match self {
            TourEvent::TourStarted { tour, .. }
            | TourEvent::HintShown { tour, .. }
            | TourEvent::HintHidden { tour, .. }
            | TourEvent::TipConsumed { tour, .. }
            | TourEvent::StepAdvanced { tour, .. }
            | TourEvent::TourCompleted { tour, .. }
            | TourEvent::TourStopped { tour, .. }
            | TourEvent::TourSkipped { tour, .. } => tour,
        }
    }

    pub fn run(&self) -> &RunId {
        match self {
            TourEvent::TourStarted { run, .. }
            | TourEvent::HintShown { run, .. }
            | TourEvent::HintHidden { run, .. }
            | TourEvent::TipConsumed { run, .. }
            | TourEvent::StepAdvanced { run, .. }
            | TourEvent::TourCompleted { run, .. }
            | TourEvent::TourStopped { run, .. }
            | TourEvent::TourSkipped { run, .. } => run,
        }
    }

    /// Wire name, matching the serialized `event` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            TourEvent::TourStarted { .. } => "tour_started",
            TourEvent::HintShown { .. } => "hint_shown",
            TourEvent::HintHidden { .. } => "hint_hidden",
            TourEvent::TipConsumed { .. } => "tip_consumed",
            TourEvent::StepAdvanced { .. } => "step_advanced",
            TourEvent::TourCompleted { .. } => "tour_completed",
            TourEvent::TourStopped { .. } => "tour_stopped",
            TourEvent::TourSkipped { .. } => "tour_skipped",
        }
    }
}
