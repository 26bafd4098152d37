use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fixit",
    about = "Fixit: dropdown field reconciliation and the Let's Fix It intake workflow",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a field scenario and print the final view and sink log
    Reconcile {
        /// Path to scenario JSON (field config, initial context, events)
        scenario: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a workflow document for structural problems
    WorkflowCheck {
        /// Path to workflow JSON
        workflow: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a workflow against one ticket record
    WorkflowEval {
        /// Path to workflow JSON
        workflow: String,

        /// Path to record JSON (a single object of column values)
        #[arg(long)]
        record: String,

        /// Status whose notifications to render (defaults to the routed status)
        #[arg(long)]
        status: Option<String>,

        /// Restrict notifications to one trigger
        #[arg(long)]
        trigger: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
