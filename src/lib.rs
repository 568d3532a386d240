//! Tourguide command-line front end: configuration, tour-file tooling and
//! scripted simulations on top of the tour runner.

pub mod cli;
pub mod config;
pub mod scenario;

pub use config::AppConfig;
pub use scenario::{simulate, Scenario, ScenarioError, SimulationReport};
