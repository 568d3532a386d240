//! Tour runner: advances registered tours step by step as the host document
//! changes and the user interacts with hints.

pub mod error;
pub mod machine;
pub mod metrics;
pub mod model;
pub mod ports;
pub mod runtime;

pub use error::RunnerError;
pub use machine::{StopReason, TourRun};
pub use model::{RunPhase, RunnerConfig, TourEvent};
pub use ports::{DocumentSource, SharedDocument};
pub use runtime::{TourRunner, TourRunnerBuilder};
