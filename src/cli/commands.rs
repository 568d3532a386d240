use clap::Subcommand;

use super::simulate::SimulateArgs;
use super::tours::{ListArgs, ValidateArgs};

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// List the tours found in tour files
    List(ListArgs),

    /// Load and check tour files, reporting every problem found
    Validate(ValidateArgs),

    /// Drive a tour through a scripted scenario and print its events
    Simulate(SimulateArgs),
}
