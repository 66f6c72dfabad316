use clap::{Args, Subcommand};
use serde::Serialize;

use dockhand::config::{self, MergeResult, Pipeline};
use dockhand::utils::validation;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct PipelineArgs {
    #[command(subcommand)]
    pub command: PipelineCommands,
}

#[derive(Subcommand)]
pub enum PipelineCommands {
    /// List configured pipelines
    List,
    /// Show a pipeline's configuration
    Show {
        /// Pipeline ID (defaults to the active pipeline)
        id: Option<String>,
    },
    /// Merge a JSON spec into a pipeline (created from defaults when absent)
    Set {
        /// Pipeline ID
        id: String,
        /// JSON spec (inline, @file, or - for stdin)
        spec: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOutput {
    pub pipelines: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PipelineResult {
    List(ListOutput),
    Show(Box<Pipeline>),
    Set(MergeResult),
}

pub fn run(args: PipelineArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<PipelineResult> {
    match args.command {
        PipelineCommands::List => {
            let pipelines = config::list()?;
            Ok((PipelineResult::List(ListOutput { pipelines }), 0))
        }

        PipelineCommands::Show { id } => {
            let pipeline = config::resolve_active(id.as_deref())?;
            Ok((PipelineResult::Show(Box::new(pipeline)), 0))
        }

        PipelineCommands::Set { id, spec } => {
            let id = validation::require_non_empty(&id, "id", "Pipeline ID cannot be empty")?;
            let result = config::merge(id, &spec)?;
            Ok((PipelineResult::Set(result), 0))
        }
    }
}
