//! String template rendering utilities.

pub struct TemplateVars;

impl TemplateVars {
    pub const BUILD_FILE: &'static str = "buildFile";
    pub const IMAGE: &'static str = "image";
    pub const TAG: &'static str = "tag";
    pub const BRANCH: &'static str = "branch";
    pub const REVISION: &'static str = "revision";
}

pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

pub fn is_present(template: &str, key: &str) -> bool {
    let placeholder = format!("{{{{{}}}}}", key);
    template.contains(&placeholder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_known_placeholders() {
        let rendered = render(
            "docker build -f {{buildFile}} -t {{image}}:{{tag}} .",
            &[
                (TemplateVars::BUILD_FILE, "Dockerfile"),
                (TemplateVars::IMAGE, "acme/app"),
                (TemplateVars::TAG, "dev"),
            ],
        );
        assert_eq!(rendered, "docker build -f Dockerfile -t acme/app:dev .");
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        let rendered = render("push {{image}}:{{tag}}", &[(TemplateVars::IMAGE, "acme/app")]);
        assert_eq!(rendered, "push acme/app:{{tag}}");
    }

    #[test]
    fn is_present_detects_placeholder() {
        assert!(is_present("-t {{image}}:{{tag}}", TemplateVars::TAG));
        assert!(!is_present("-t {{image}}", TemplateVars::TAG));
    }
}
