//! Fixit CLI: the `fixit` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    support::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Reconcile { scenario, json } => commands::reconcile::run(scenario, json),

        Commands::WorkflowCheck { workflow, json } => commands::workflow_check::run(workflow, json),

        Commands::WorkflowEval {
            workflow,
            record,
            status,
            trigger,
            json,
        } => commands::workflow_eval::run(commands::workflow_eval::Args {
            workflow,
            record,
            status,
            trigger,
            json,
        }),
    }
}
