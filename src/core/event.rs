//! Push events: the input that drives trigger resolution.
//!
//! An event carries a branch reference. It comes from one of three places:
//! an explicit `--branch`, a fully-qualified `--ref` (CI platforms hand these
//! out as `refs/heads/...`), or the HEAD of the current checkout.

use serde::Serialize;

use crate::error::Result;
use crate::git;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Branch,
    Ref,
    GitHead,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEvent {
    /// Branch name, if the reference points at a branch at all.
    /// Tag pushes and other non-branch refs carry None and never trigger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// The reference as supplied, before any normalization.
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub source: EventSource,
}

impl PushEvent {
    pub fn from_branch(branch: &str, revision: Option<String>) -> Self {
        Self {
            branch: Some(branch.to_string()),
            reference: format!("refs/heads/{}", branch),
            revision,
            source: EventSource::Branch,
        }
    }

    pub fn from_ref(reference: &str, revision: Option<String>) -> Self {
        Self {
            branch: branch_from_ref(reference),
            reference: reference.to_string(),
            revision,
            source: EventSource::Ref,
        }
    }

    /// Derive an event from the checkout at `dir` (manual dispatch).
    pub fn from_repository(dir: &str, revision: Option<String>) -> Result<Self> {
        let branch = git::current_branch(dir)?;
        let revision = match revision {
            Some(rev) => Some(rev),
            None => Some(git::head_revision(dir)?),
        };
        Ok(Self {
            branch: Some(branch.clone()),
            reference: format!("refs/heads/{}", branch),
            revision,
            source: EventSource::GitHead,
        })
    }
}

/// Extract a branch name from a git reference.
///
/// `refs/heads/X` maps to `X`; any other `refs/...` form (tags, pull heads)
/// is not a branch; a bare name is taken as a branch name directly.
pub fn branch_from_ref(reference: &str) -> Option<String> {
    if let Some(branch) = reference.strip_prefix("refs/heads/") {
        if branch.is_empty() {
            return None;
        }
        return Some(branch.to_string());
    }

    if reference.starts_with("refs/") {
        return None;
    }

    if reference.is_empty() {
        None
    } else {
        Some(reference.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_ref_strips_heads_prefix() {
        assert_eq!(branch_from_ref("refs/heads/main"), Some("main".to_string()));
        assert_eq!(
            branch_from_ref("refs/heads/test-actions"),
            Some("test-actions".to_string())
        );
    }

    #[test]
    fn tag_ref_is_not_a_branch() {
        assert_eq!(branch_from_ref("refs/tags/v1.2.0"), None);
        assert_eq!(branch_from_ref("refs/pull/17/merge"), None);
    }

    #[test]
    fn bare_name_is_taken_as_branch() {
        assert_eq!(branch_from_ref("develop"), Some("develop".to_string()));
    }

    #[test]
    fn empty_forms_are_rejected() {
        assert_eq!(branch_from_ref(""), None);
        assert_eq!(branch_from_ref("refs/heads/"), None);
    }

    #[test]
    fn from_ref_carries_raw_reference() {
        let event = PushEvent::from_ref("refs/tags/v1.0.0", None);
        assert_eq!(event.branch, None);
        assert_eq!(event.reference, "refs/tags/v1.0.0");
        assert_eq!(event.source, EventSource::Ref);
    }

    #[test]
    fn from_branch_builds_qualified_reference() {
        let event = PushEvent::from_branch("develop", Some("abc123".to_string()));
        assert_eq!(event.branch, Some("develop".to_string()));
        assert_eq!(event.reference, "refs/heads/develop");
        assert_eq!(event.revision, Some("abc123".to_string()));
    }
}
