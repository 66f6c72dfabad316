//! The sequential build-and-publish job.
//!
//! A run is one job: login → checkout → build → push. Steps execute in
//! order; the first failure aborts the run and the remaining steps are
//! recorded as skipped. There is no retry logic — the invoking platform
//! owns scheduling and re-runs.

use std::path::Path;

use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Pipeline;
use crate::environment::Environment;
use crate::event::PushEvent;
use crate::image;
use crate::registry;
use crate::shell;
use crate::trigger::{self, BuildAction};
use crate::utils::command::{self, CommandOutput};

pub const STEP_LOGIN: &str = "login";
pub const STEP_CHECKOUT: &str = "checkout";
pub const STEP_BUILD: &str = "build";
pub const STEP_PUSH: &str = "push";

/// A step ready to execute: argv plus optional stdin payload.
///
/// `display` is the recorded command string; stdin payloads (the registry
/// password) are never part of it.
#[derive(Debug, Clone)]
pub struct PlannedStep {
    pub id: &'static str,
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub display: String,
    /// Set when the step cannot run at all (e.g. credentials absent).
    /// The runner fails the step with this reason without invoking anything.
    pub unavailable: Option<String>,
}

impl PlannedStep {
    fn new(id: &'static str, program: &str, args: Vec<String>) -> Self {
        let display = shell::format_command(program, &args);
        Self {
            id,
            program: program.to_string(),
            args,
            stdin: None,
            display,
            unavailable: None,
        }
    }

    fn with_stdin(mut self, data: String) -> Self {
        self.stdin = Some(data);
        self
    }

    fn unavailable(id: &'static str, reason: String) -> Self {
        Self {
            id,
            program: String::new(),
            args: Vec::new(),
            stdin: None,
            display: String::new(),
            unavailable: Some(reason),
        }
    }
}

/// Seam for executing planned steps; tests substitute a fake.
pub trait StepExecutor {
    fn execute(&self, step: &PlannedStep, workdir: &Path) -> CommandOutput;
}

/// Executes steps as local processes.
pub struct CommandStepExecutor;

impl StepExecutor for CommandStepExecutor {
    fn execute(&self, step: &PlannedStep, workdir: &Path) -> CommandOutput {
        match &step.stdin {
            Some(data) => {
                command::capture_with_stdin(&step.program, &step.args, data, Some(workdir))
            }
            None => command::capture(&step.program, &step.args, Some(workdir)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub id: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
    /// The event's branch matched no rule: a successful run that did nothing.
    NoAction,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_steps: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub pipeline_id: String,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<BuildAction>,
    pub status: RunStatus,
    pub steps: Vec<StepResult>,
    pub summary: RunSummary,
    pub started_at: String,
    pub finished_at: String,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.status != RunStatus::Failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Ready,
    NoAction,
}

/// Dry resolution: what a run would do, without reading the environment or
/// touching any external tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub pipeline_id: String,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<BuildAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
    pub status: PlanStatus,
}

pub fn plan(event: &PushEvent, pipeline: &Pipeline) -> PlanReport {
    let action = trigger::resolve(event, pipeline);
    let (steps, status) = match &action {
        Some(_) => (
            vec![
                STEP_LOGIN.to_string(),
                STEP_CHECKOUT.to_string(),
                STEP_BUILD.to_string(),
                STEP_PUSH.to_string(),
            ],
            PlanStatus::Ready,
        ),
        None => (Vec::new(), PlanStatus::NoAction),
    };

    PlanReport {
        pipeline_id: pipeline.id.clone(),
        reference: event.reference.clone(),
        branch: event.branch.clone(),
        action,
        steps,
        status,
    }
}

fn plan_steps(
    action: &BuildAction,
    event: &PushEvent,
    pipeline: &Pipeline,
    env: &Environment,
) -> Vec<PlannedStep> {
    let login = match registry::credentials_from(env) {
        Ok(creds) => {
            let args = registry::login_args(pipeline.registry.as_deref(), &creds.username);
            PlannedStep::new(STEP_LOGIN, registry::DOCKER_PROGRAM, args)
                .with_stdin(creds.password().to_string())
        }
        Err(e) => PlannedStep::unavailable(STEP_LOGIN, e.message),
    };

    let checkout = match &event.revision {
        Some(revision) => PlannedStep::new(
            STEP_CHECKOUT,
            "git",
            vec!["checkout".to_string(), revision.clone()],
        ),
        None => PlannedStep::new(
            STEP_CHECKOUT,
            "git",
            vec!["rev-parse".to_string(), "HEAD".to_string()],
        ),
    };

    let (build_program, build_args) =
        image::build_command(action, pipeline.build_command_template.as_deref());
    let build = PlannedStep::new(STEP_BUILD, &build_program, build_args);

    let push = PlannedStep::new(
        STEP_PUSH,
        registry::DOCKER_PROGRAM,
        registry::push_args(&action.reference()),
    );

    vec![login, checkout, build, push]
}

/// Execute the job for an event.
///
/// A branch that matches no rule produces a NoAction report with zero steps
/// and no external invocations.
pub fn run(
    event: &PushEvent,
    pipeline: &Pipeline,
    env: &Environment,
    workdir: &Path,
    executor: &dyn StepExecutor,
) -> RunReport {
    let run_id = Uuid::new_v4().to_string();
    let started_at = Local::now().to_rfc3339();

    let Some(action) = trigger::resolve(event, pipeline) else {
        log_status!(
            "run",
            "No build rule for '{}', taking no action",
            event.reference
        );
        return RunReport {
            run_id,
            pipeline_id: pipeline.id.clone(),
            reference: event.reference.clone(),
            branch: event.branch.clone(),
            revision: event.revision.clone(),
            action: None,
            status: RunStatus::NoAction,
            steps: Vec::new(),
            summary: RunSummary {
                total_steps: 0,
                succeeded: 0,
                failed: 0,
                skipped: 0,
            },
            started_at: started_at.clone(),
            finished_at: Local::now().to_rfc3339(),
        };
    };

    log_status!("run", "Branch '{}' -> {}", action.branch, action.reference());

    let planned = plan_steps(&action, event, pipeline, env);
    let mut steps: Vec<StepResult> = Vec::with_capacity(planned.len());
    let mut revision = event.revision.clone();
    let mut aborted = false;

    for step in planned {
        if aborted {
            steps.push(StepResult {
                id: step.id.to_string(),
                status: StepStatus::Skipped,
                command: step.display,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: None,
            });
            continue;
        }

        if let Some(reason) = step.unavailable {
            log_status!("run", "{}: {}", step.id, reason);
            aborted = true;
            steps.push(StepResult {
                id: step.id.to_string(),
                status: StepStatus::Failed,
                command: String::new(),
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(reason),
            });
            continue;
        }

        log_status!("run", "{}: {}", step.id, step.display);
        let output = executor.execute(&step, workdir);

        if step.id == STEP_CHECKOUT && revision.is_none() && output.success {
            let resolved = output.stdout.trim();
            if !resolved.is_empty() {
                revision = Some(resolved.to_string());
            }
        }

        let failed = !output.success;
        steps.push(StepResult {
            id: step.id.to_string(),
            status: if failed {
                StepStatus::Failed
            } else {
                StepStatus::Succeeded
            },
            command: step.display,
            exit_code: Some(output.exit_code),
            stdout: output.stdout,
            stderr: output.stderr,
            error: failed.then(|| format!("Step '{}' exited with code {}", step.id, output.exit_code)),
        });

        if failed {
            aborted = true;
        }
    }

    let succeeded = steps
        .iter()
        .filter(|s| s.status == StepStatus::Succeeded)
        .count();
    let failed = steps.iter().filter(|s| s.status == StepStatus::Failed).count();
    let skipped = steps.iter().filter(|s| s.status == StepStatus::Skipped).count();

    let status = if failed > 0 {
        RunStatus::Failed
    } else {
        RunStatus::Succeeded
    };

    RunReport {
        run_id,
        pipeline_id: pipeline.id.clone(),
        reference: event.reference.clone(),
        branch: event.branch.clone(),
        revision,
        action: Some(action),
        status,
        steps,
        summary: RunSummary {
            total_steps: succeeded + failed + skipped,
            succeeded,
            failed,
            skipped,
        },
        started_at,
        finished_at: Local::now().to_rfc3339(),
    }
}
