use anyhow::Result;

use super::env::CliArgs;
use super::simulate::cmd_simulate;
use super::tours::{cmd_list, cmd_validate};
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::List(args) => cmd_list(args, ctx, cli.output),
        Commands::Validate(args) => cmd_validate(args, ctx, cli.output),
        Commands::Simulate(args) => cmd_simulate(args, ctx, cli.output).await,
    }
}
