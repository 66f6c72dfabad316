use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::Path;

use dockhand::defaults;
use dockhand::environment::{self, CheckReport, Environment, EnvVarSpec};
use dockhand::log_status;
use dockhand::utils::io;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct EnvArgs {
    #[command(subcommand)]
    pub command: EnvCommands,
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// List the manifest without reading the environment
    List,
    /// Validate the live environment against the manifest
    Check(CheckArgs),
    /// Render the staging template
    Template(TemplateArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Restrict the check to one group
    #[arg(long)]
    pub group: Option<String>,
}

#[derive(Args)]
pub struct TemplateArgs {
    /// Write the template to a file instead of returning it
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOutput {
    pub groups: Vec<String>,
    pub vars: Vec<EnvVarSpec>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub var_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EnvResult {
    List(ListOutput),
    Check(CheckReport),
    Template(TemplateOutput),
}

pub fn run(args: EnvArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<EnvResult> {
    let manifest = defaults::default_manifest();

    match args.command {
        EnvCommands::List => {
            let output = ListOutput {
                groups: manifest.groups(),
                vars: manifest.vars,
            };
            Ok((EnvResult::List(output), 0))
        }

        EnvCommands::Check(check_args) => {
            let env = Environment::from_process();
            let report = environment::check(&manifest, &env, check_args.group.as_deref())?;
            let exit_code = if report.passed { 0 } else { 2 };
            Ok((EnvResult::Check(report), exit_code))
        }

        EnvCommands::Template(template_args) => {
            let content = environment::render_template(&manifest);
            let var_count = manifest.vars.len();

            let output = match template_args.output {
                Some(path) => {
                    let expanded = shellexpand::tilde(&path).to_string();
                    io::write_file(Path::new(&expanded), &content, "write env template")?;
                    log_status!("env", "Template written to {}", expanded);
                    TemplateOutput {
                        path: Some(expanded),
                        content: None,
                        var_count,
                    }
                }
                None => TemplateOutput {
                    path: None,
                    content: Some(content),
                    var_count,
                },
            };

            Ok((EnvResult::Template(output), 0))
        }
    }
}
