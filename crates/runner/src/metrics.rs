use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct Counters {
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    runs_stopped: AtomicU64,
    runs_skipped: AtomicU64,
    hints_shown: AtomicU64,
    steps_advanced: AtomicU64,
    predicate_errors: AtomicU64,
}

static COUNTERS: Lazy<Counters> = Lazy::new(Counters::default);

fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn record_run_started(_tour: &str) {
    increment(&COUNTERS.runs_started);
}

pub fn record_run_completed(_tour: &str) {
    increment(&COUNTERS.runs_completed);
}

pub fn record_run_stopped(_tour: &str) {
    increment(&COUNTERS.runs_stopped);
}

pub fn record_run_skipped(_tour: &str) {
    increment(&COUNTERS.runs_skipped);
}

pub fn record_hint_shown(_tour: &str) {
    increment(&COUNTERS.hints_shown);
}

pub fn record_step_advanced(_tour: &str) {
    increment(&COUNTERS.steps_advanced);
}

pub fn record_predicate_error(_tour: &str) {
    increment(&COUNTERS.predicate_errors);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunnerMetricsSnapshot {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub runs_stopped: u64,
    pub runs_skipped: u64,
    pub hints_shown: u64,
    pub steps_advanced: u64,
    pub predicate_errors: u64,
}

/// Process-wide totals since start-up.
pub fn snapshot() -> RunnerMetricsSnapshot {
    RunnerMetricsSnapshot {
        runs_started: COUNTERS.runs_started.load(Ordering::Relaxed),
        runs_completed: COUNTERS.runs_completed.load(Ordering::Relaxed),
        runs_stopped: COUNTERS.runs_stopped.load(Ordering::Relaxed),
        runs_skipped: COUNTERS.runs_skipped.load(Ordering::Relaxed),
        hints_shown: COUNTERS.hints_shown.load(Ordering::Relaxed),
        steps_advanced: COUNTERS.steps_advanced.load(Ordering::Relaxed),
        predicate_errors: COUNTERS.predicate_errors.load(Ordering::Relaxed),
    }
}
