use clap::Args;

use dockhand::config;
use dockhand::pipeline::{self, PlanReport};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct PlanArgs {
    /// Branch name to resolve
    #[arg(long)]
    pub branch: Option<String>,

    /// Fully-qualified git ref (e.g. refs/heads/main)
    #[arg(long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    /// Pipeline ID (defaults to the active pipeline)
    #[arg(long)]
    pub pipeline: Option<String>,

    /// Directory containing the source checkout
    #[arg(long, default_value = ".")]
    pub workdir: String,
}

pub fn run(args: PlanArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<PlanReport> {
    let pipeline_cfg = config::resolve_active(args.pipeline.as_deref())?;
    let workdir = shellexpand::tilde(&args.workdir).to_string();

    let event = crate::commands::resolve_event(
        args.branch.as_deref(),
        args.reference.as_deref(),
        None,
        &workdir,
    )?;

    Ok((pipeline::plan(&event, &pipeline_cfg), 0))
}
