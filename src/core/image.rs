//! Build command construction for the external image build tool.

use crate::defaults::DEFAULT_BUILD_COMMAND_TEMPLATE;
use crate::trigger::BuildAction;
use crate::utils::template::{self, TemplateVars};

/// Render the build command for an action as (program, args).
///
/// The template is split on whitespace for direct execution, the same way
/// the recorded command is displayed. Build-file paths go through tilde
/// expansion first.
pub fn build_command(action: &BuildAction, custom_template: Option<&str>) -> (String, Vec<String>) {
    let build_file = shellexpand::tilde(&action.build_file).to_string();

    let rendered = template::render(
        custom_template.unwrap_or(DEFAULT_BUILD_COMMAND_TEMPLATE),
        &[
            (TemplateVars::BUILD_FILE, build_file.as_str()),
            (TemplateVars::IMAGE, action.image.as_str()),
            (TemplateVars::TAG, action.tag.as_str()),
            (TemplateVars::BRANCH, action.branch.as_str()),
        ],
    );

    let mut parts = rendered.split_whitespace().map(|s| s.to_string());
    let program = parts.next().unwrap_or_else(|| "docker".to_string());
    let args: Vec<String> = parts.collect();

    (program, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action() -> BuildAction {
        BuildAction {
            branch: "develop".to_string(),
            tag: "dev".to_string(),
            image: "acme/app".to_string(),
            build_file: "Dockerfile".to_string(),
        }
    }

    #[test]
    fn default_template_builds_tagged_image() {
        let (program, args) = build_command(&action(), None);
        assert_eq!(program, "docker");
        assert_eq!(
            args,
            vec!["build", "-f", "Dockerfile", "-t", "acme/app:dev", "."]
        );
    }

    #[test]
    fn custom_template_is_rendered() {
        let (program, args) = build_command(
            &action(),
            Some("buildah bud -f {{buildFile}} -t {{image}}:{{tag}}"),
        );
        assert_eq!(program, "buildah");
        assert_eq!(args, vec!["bud", "-f", "Dockerfile", "-t", "acme/app:dev"]);
    }

    #[test]
    fn same_action_renders_same_command() {
        let first = build_command(&action(), None);
        let second = build_command(&action(), None);
        assert_eq!(first, second);
    }
}
