use dockhand::event::PushEvent;
use dockhand::git;
use dockhand::utils::validation;

pub type CmdResult<T> = dockhand::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod env;
pub mod pipeline;
pub mod plan;
pub mod run;

/// Resolve the push event from CLI flags, falling back to the checkout's HEAD.
///
/// `--branch` and `--ref` are two spellings of the same input; both at once
/// is ambiguous and rejected.
pub(crate) fn resolve_event(
    branch: Option<&str>,
    reference: Option<&str>,
    revision: Option<String>,
    workdir: &str,
) -> dockhand::Result<PushEvent> {
    match (branch, reference) {
        (Some(_), Some(_)) => Err(dockhand::Error::validation_invalid_argument(
            "branch",
            "Provide either --branch or --ref, not both",
            None,
            None,
        )),
        (Some(branch), None) => {
            let branch = validation::require_non_empty(branch, "branch", "Branch name cannot be empty")?;
            Ok(PushEvent::from_branch(branch, revision))
        }
        (None, Some(reference)) => {
            let reference = validation::require_non_empty(reference, "ref", "Ref cannot be empty")?;
            Ok(PushEvent::from_ref(reference, revision))
        }
        (None, None) => {
            if !git::is_work_tree(workdir) {
                return Err(dockhand::Error::validation_invalid_argument(
                    "workdir",
                    format!("'{}' is not inside a git checkout", workdir),
                    None,
                    None,
                )
                .with_hint("Pass --branch or --ref to name the triggering branch directly"));
            }
            PushEvent::from_repository(workdir, revision)
        }
    }
}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (dockhand::Result<serde_json::Value>, i32) {
    crate::tty::status("dockhand is working...");

    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Plan(args) => dispatch!(args, global, plan),
        crate::Commands::Env(args) => dispatch!(args, global, env),
        crate::Commands::Pipeline(args) => dispatch!(args, global, pipeline),
    }
}
