//! Thin wrappers over the git CLI for revision resolution.

use crate::error::{Error, Result};
use crate::utils::command;

/// Current branch name of the checkout at `dir`.
///
/// A detached HEAD reports `HEAD`, which no trigger rule matches, so a
/// detached checkout resolves to a no-action run unless a branch is given
/// explicitly.
pub fn current_branch(dir: &str) -> Result<String> {
    command::run_in(dir, "git", &["rev-parse", "--abbrev-ref", "HEAD"], "git rev-parse")
        .map_err(|e| Error::git_command_failed(e.message))
}

/// Full SHA of HEAD at `dir`.
pub fn head_revision(dir: &str) -> Result<String> {
    command::run_in(dir, "git", &["rev-parse", "HEAD"], "git rev-parse HEAD")
        .map_err(|e| Error::git_command_failed(e.message))
}

/// True when `dir` is inside a git work tree.
pub fn is_work_tree(dir: &str) -> bool {
    command::run_in_optional(dir, "git", &["rev-parse", "--is-inside-work-tree"])
        .map(|out| out == "true")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn init_repo(dir: &std::path::Path) {
        for args in [
            vec!["init", "-q", "-b", "main"],
            vec!["config", "user.email", "ci@example.invalid"],
            vec!["config", "user.name", "ci"],
            vec!["commit", "--allow-empty", "-q", "-m", "seed"],
        ] {
            let status = Command::new("git")
                .args(&args)
                .current_dir(dir)
                .status()
                .expect("git available in test environment");
            assert!(status.success(), "git {:?} failed", args);
        }
    }

    #[test]
    fn current_branch_reports_checked_out_branch() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        let branch = current_branch(&dir.path().to_string_lossy()).unwrap();
        assert_eq!(branch, "main");
    }

    #[test]
    fn head_revision_is_full_sha() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        let sha = head_revision(&dir.path().to_string_lossy()).unwrap();
        assert_eq!(sha.len(), 40);
    }

    #[test]
    fn is_work_tree_false_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_work_tree(&dir.path().to_string_lossy()));
    }
}
