/// Escape a value for use inside single quotes.
/// Replaces `'` with `'\''` (end quote, escaped quote, start quote).
pub fn escape_single_quote_content(value: &str) -> String {
    value.replace('\'', "'\\''")
}

/// Quote a single argument for display in a recorded command string.
/// - Empty strings become `''`
/// - Strings with shell metacharacters are wrapped in single quotes
/// - Embedded single quotes are escaped
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    // Characters that require quoting
    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", escape_single_quote_content(arg))
}

/// Render an argv as a copy-pasteable command line.
///
/// Step reports record what was executed; this keeps those strings safe to
/// paste back into a shell. Secrets fed via stdin never pass through here.
pub fn format_command(program: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(quote_arg(program));
    for arg in args {
        parts.push(quote_arg(arg));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_arg_simple() {
        assert_eq!(quote_arg("docker"), "docker");
        assert_eq!(quote_arg("acme/app:dev"), "acme/app:dev");
    }

    #[test]
    fn quote_arg_with_spaces() {
        assert_eq!(quote_arg("build files/Dockerfile"), "'build files/Dockerfile'");
    }

    #[test]
    fn quote_arg_with_single_quote() {
        assert_eq!(quote_arg("it's"), "'it'\\''s'");
    }

    #[test]
    fn quote_arg_empty() {
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn format_command_quotes_only_what_needs_it() {
        let args = vec![
            "build".to_string(),
            "-f".to_string(),
            "docker/app test.Dockerfile".to_string(),
        ];
        assert_eq!(
            format_command("docker", &args),
            "docker build -f 'docker/app test.Dockerfile'"
        );
    }
}
