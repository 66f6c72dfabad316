//! Branch-to-tag trigger rules and their resolution.
//!
//! A push event selects at most one build action: the first rule whose
//! branch matches exactly. Everything else is a no-action run.

use serde::{Deserialize, Serialize};

use crate::config::Pipeline;
use crate::event::PushEvent;

/// One row of the branch→tag mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRule {
    pub branch: String,
    pub tag: String,
    /// Overrides the pipeline's build-file for this branch only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_file: Option<String>,
}

impl TriggerRule {
    pub fn new(branch: &str, tag: &str) -> Self {
        Self {
            branch: branch.to_string(),
            tag: tag.to_string(),
            build_file: None,
        }
    }
}

/// The single build-and-publish action a recognized branch maps to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildAction {
    pub branch: String,
    pub tag: String,
    pub image: String,
    pub build_file: String,
}

impl BuildAction {
    /// Full image reference the build tags and the push publishes.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}

/// Resolve an event against a pipeline's rules.
///
/// Returns the action for exactly one recognized branch, None for any
/// unrecognized branch or non-branch ref. Pure: no environment reads, no
/// side effects, so re-resolution of the same event always derives the
/// same tag.
pub fn resolve(event: &PushEvent, pipeline: &Pipeline) -> Option<BuildAction> {
    let branch = event.branch.as_deref()?;

    pipeline
        .rules
        .iter()
        .find(|rule| rule.branch == branch)
        .map(|rule| BuildAction {
            branch: rule.branch.clone(),
            tag: rule.tag.clone(),
            image: pipeline.image.clone(),
            build_file: rule
                .build_file
                .clone()
                .unwrap_or_else(|| pipeline.build_file.clone()),
        })
}
