use clap::Args;
use std::path::Path;

use dockhand::config;
use dockhand::environment::Environment;
use dockhand::pipeline::{self, CommandStepExecutor, RunReport};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Branch name that triggered the run
    #[arg(long)]
    pub branch: Option<String>,

    /// Fully-qualified git ref (e.g. refs/heads/main)
    #[arg(long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    /// Revision to check out before building
    #[arg(long)]
    pub revision: Option<String>,

    /// Pipeline ID (defaults to the active pipeline)
    #[arg(long)]
    pub pipeline: Option<String>,

    /// Directory containing the source checkout
    #[arg(long, default_value = ".")]
    pub workdir: String,
}

pub fn run(args: RunArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RunReport> {
    let pipeline_cfg = config::resolve_active(args.pipeline.as_deref())?;
    let workdir = shellexpand::tilde(&args.workdir).to_string();

    let event = crate::commands::resolve_event(
        args.branch.as_deref(),
        args.reference.as_deref(),
        args.revision,
        &workdir,
    )?;

    let env = Environment::from_process();
    let report = pipeline::run(
        &event,
        &pipeline_cfg,
        &env,
        Path::new(&workdir),
        &CommandStepExecutor,
    );

    // Zero for success and no-action runs; the host platform only needs to
    // see a failed step as a failed job.
    let exit_code = if report.success() { 0 } else { 20 };

    Ok((report, exit_code))
}
