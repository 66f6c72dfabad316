use clap::{Parser, Subcommand};

mod commands;
mod output;
mod tty;

use commands::GlobalArgs;
use commands::{env, pipeline, plan, run};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "dockhand")]
#[command(version = VERSION)]
#[command(about = "CLI for branch-triggered container image publishing and environment staging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the build-and-publish job for a push event
    Run(run::RunArgs),
    /// Show what a run would do without executing anything
    Plan(plan::PlanArgs),
    /// Environment manifest operations
    Env(env::EnvArgs),
    /// Manage pipeline configurations
    Pipeline(pipeline::PipelineArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
