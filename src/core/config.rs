//! Pipeline configuration entities and their JSON storage.
//!
//! Pipelines live as `~/.config/dockhand/pipelines/<id>.json`; the global
//! `dockhand.json` names the active one. Missing files fall back to the
//! compiled default pipeline so a fresh install can run without any setup.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::{Error, Result};
use crate::trigger::TriggerRule;
use crate::utils::io;
use crate::utils::template::{self, TemplateVars};

pub const DEFAULT_PIPELINE_ID: &str = "default";

// ============================================================================
// JSON Parsing Utilities (internal)
// ============================================================================

/// Parse JSON string into typed value.
pub(crate) fn from_str<T: DeserializeOwned>(s: &str) -> Result<T> {
    serde_json::from_str(s)
        .map_err(|e| Error::validation_invalid_json(e, Some("parse json".to_string())))
}

/// Serialize value to pretty-printed JSON string.
pub(crate) fn to_string_pretty<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize json".to_string())))
}

/// Read JSON spec from string, file (@path), or stdin (-).
pub fn read_json_spec_to_string(spec: &str) -> Result<String> {
    use std::io::IsTerminal;

    if spec.trim() == "-" {
        let mut buf = String::new();
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(Error::validation_invalid_argument(
                "json",
                "Cannot read JSON from stdin when stdin is a TTY",
                None,
                None,
            ));
        }
        stdin
            .read_to_string(&mut buf)
            .map_err(|e| Error::internal_io(e.to_string(), Some("read stdin".to_string())))?;
        return Ok(buf);
    }

    if let Some(path) = spec.strip_prefix('@') {
        if path.trim().is_empty() {
            return Err(Error::validation_invalid_argument(
                "json",
                "Invalid JSON spec '@' (missing file path)",
                None,
                None,
            ));
        }
        let expanded = shellexpand::tilde(path).to_string();
        return io::read_file(Path::new(&expanded), &format!("read {}", path));
    }

    Ok(spec.to_string())
}

// ============================================================================
// Pipeline entity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    #[serde(default)]
    pub id: String,

    /// Image name pushed to the registry, without a tag (e.g. "acme/app").
    pub image: String,

    /// Build-file handed to the external build tool, relative to the workdir.
    #[serde(default = "default_build_file")]
    pub build_file: String,

    /// Registry host for login. None means the tool's default registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Overrides the built-in build command. Placeholders: {{buildFile}},
    /// {{image}}, {{tag}}, {{branch}}.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_command_template: Option<String>,

    #[serde(default)]
    pub rules: Vec<TriggerRule>,
}

fn default_build_file() -> String {
    "Dockerfile".to_string()
}

impl Pipeline {
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "image",
                None,
                "Image name cannot be empty",
            ));
        }

        if let Some(custom) = &self.build_command_template {
            // Without {{tag}} every branch would build the same reference.
            if !template::is_present(custom, TemplateVars::TAG) {
                return Err(Error::config_invalid_value(
                    "buildCommandTemplate",
                    Some(custom.clone()),
                    "Template must reference {{tag}}",
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for rule in &self.rules {
            if rule.branch.trim().is_empty() {
                return Err(Error::config_invalid_value(
                    "rules.branch",
                    None,
                    "Rule branch cannot be empty",
                ));
            }
            if rule.tag.trim().is_empty() {
                return Err(Error::config_invalid_value(
                    "rules.tag",
                    Some(rule.branch.clone()),
                    "Rule tag cannot be empty",
                ));
            }
            if !seen.insert(rule.branch.clone()) {
                return Err(Error::config_invalid_value(
                    "rules.branch",
                    Some(rule.branch.clone()),
                    "Duplicate branch in trigger rules",
                ));
            }
        }

        Ok(())
    }
}

/// Root configuration structure for dockhand.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_pipeline: Option<String>,
}

/// Result of a `pipeline set` merge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub id: String,
    pub updated_fields: Vec<String>,
    pub created: bool,
}

// ============================================================================
// Storage
// ============================================================================

pub fn load(id: &str) -> Result<Pipeline> {
    load_from(&crate::paths::pipelines()?, id)
}

pub fn load_from(dir: &Path, id: &str) -> Result<Pipeline> {
    let path = dir.join(format!("{}.json", id));
    if !path.exists() {
        if id == DEFAULT_PIPELINE_ID {
            return Ok(defaults::default_pipeline());
        }
        return Err(Error::pipeline_not_found(id));
    }

    let raw = io::read_file(&path, &format!("read pipeline {}", id))?;
    let mut pipeline: Pipeline = serde_json::from_str(&raw)
        .map_err(|e| Error::config_invalid_json(path.to_string_lossy(), e))?;
    pipeline.id = id.to_string();
    pipeline.validate()?;
    Ok(pipeline)
}

pub fn save(pipeline: &Pipeline) -> Result<()> {
    save_to(&crate::paths::pipelines()?, pipeline)
}

pub fn save_to(dir: &Path, pipeline: &Pipeline) -> Result<()> {
    pipeline.validate()?;
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some("create pipelines dir".to_string())))?;

    let path = dir.join(format!("{}.json", pipeline.id));
    let payload = to_string_pretty(pipeline)?;
    io::write_file_atomic(&path, &payload, &format!("write pipeline {}", pipeline.id))
}

pub fn list() -> Result<Vec<String>> {
    list_from(&crate::paths::pipelines()?)
}

pub fn list_from(dir: &Path) -> Result<Vec<String>> {
    let mut ids = vec![DEFAULT_PIPELINE_ID.to_string()];

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(ids), // no config dir yet: compiled default only
    };

    for entry in entries.flatten() {
        let path: PathBuf = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if stem != DEFAULT_PIPELINE_ID {
                ids.push(stem.to_string());
            }
        }
    }

    ids[1..].sort();
    Ok(ids)
}

/// Pipeline for a run: explicit id, else the globally active one, else the
/// compiled default.
pub fn resolve_active(explicit: Option<&str>) -> Result<Pipeline> {
    if let Some(id) = explicit {
        return load(id);
    }

    let global = load_global()?;
    match global.active_pipeline.as_deref() {
        Some(id) => load(id),
        None => Ok(defaults::default_pipeline()),
    }
}

pub fn load_global() -> Result<GlobalConfig> {
    let path = crate::paths::dockhand_json()?;
    if !path.exists() {
        return Ok(GlobalConfig::default());
    }
    let raw = io::read_file(&path, "read dockhand.json")?;
    serde_json::from_str(&raw).map_err(|e| Error::config_invalid_json(path.to_string_lossy(), e))
}

/// Merge a JSON spec into a stored pipeline (creating it from the compiled
/// default when absent). Top-level keys in the spec replace stored values.
pub fn merge(id: &str, spec: &str) -> Result<MergeResult> {
    merge_in(&crate::paths::pipelines()?, id, spec)
}

pub fn merge_in(dir: &Path, id: &str, spec: &str) -> Result<MergeResult> {
    let raw = read_json_spec_to_string(spec)?;
    let patch: Value = from_str(&raw)?;

    let Value::Object(patch_obj) = patch else {
        return Err(Error::validation_invalid_argument(
            "json",
            "Pipeline spec must be a JSON object",
            Some(id.to_string()),
            None,
        ));
    };

    let created = !dir.join(format!("{}.json", id)).exists();
    let base = match load_from(dir, id) {
        Ok(pipeline) => pipeline,
        Err(e) if e.code == crate::ErrorCode::PipelineNotFound => {
            let mut pipeline = defaults::default_pipeline();
            pipeline.id = id.to_string();
            pipeline
        }
        Err(e) => return Err(e),
    };

    let mut base_value = serde_json::to_value(&base)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize pipeline".to_string())))?;

    let mut updated_fields = Vec::new();
    if let Value::Object(base_obj) = &mut base_value {
        for (key, value) in patch_obj {
            if key == "id" {
                continue; // id comes from the file name
            }
            updated_fields.push(key.clone());
            base_obj.insert(key, value);
        }
    }

    let mut merged: Pipeline = serde_json::from_value(base_value)
        .map_err(|e| Error::validation_invalid_json(e, Some(format!("merge pipeline {}", id))))?;
    merged.id = id.to_string();

    save_to(dir, &merged)?;

    Ok(MergeResult {
        id: id.to_string(),
        updated_fields,
        created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_default_falls_back_to_compiled() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = load_from(dir.path(), DEFAULT_PIPELINE_ID).unwrap();
        assert_eq!(pipeline.rules.len(), 3);
    }

    #[test]
    fn load_missing_custom_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(dir.path(), "staging").unwrap_err();
        assert_eq!(err.code.as_str(), "pipeline.not_found");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = defaults::default_pipeline();
        pipeline.id = "staging".to_string();
        pipeline.image = "acme/staging".to_string();

        save_to(dir.path(), &pipeline).unwrap();
        let loaded = load_from(dir.path(), "staging").unwrap();
        assert_eq!(loaded.image, "acme/staging");
        assert_eq!(loaded.id, "staging");
    }

    #[test]
    fn validate_rejects_duplicate_branches() {
        let mut pipeline = defaults::default_pipeline();
        pipeline
            .rules
            .push(crate::trigger::TriggerRule::new("main", "again"));

        let err = pipeline.validate().unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn validate_rejects_template_without_tag() {
        let mut pipeline = defaults::default_pipeline();
        pipeline.build_command_template =
            Some("docker build -f {{buildFile}} -t {{image}}:latest .".to_string());
        assert!(pipeline.validate().is_err());

        pipeline.build_command_template =
            Some("docker build -f {{buildFile}} -t {{image}}:{{tag}} .".to_string());
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_image() {
        let mut pipeline = defaults::default_pipeline();
        pipeline.image = "  ".to_string();
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn merge_overrides_top_level_fields() {
        let dir = tempfile::tempdir().unwrap();
        let result = merge_in(dir.path(), "default", r#"{"image": "acme/app"}"#).unwrap();
        assert!(result.created);
        assert_eq!(result.updated_fields, vec!["image"]);

        let loaded = load_from(dir.path(), "default").unwrap();
        assert_eq!(loaded.image, "acme/app");
        // untouched fields keep their defaults
        assert_eq!(loaded.rules.len(), 3);
    }

    #[test]
    fn merge_rejects_invalid_rules() {
        let dir = tempfile::tempdir().unwrap();
        let err = merge_in(
            dir.path(),
            "default",
            r#"{"rules": [{"branch": "main", "tag": ""}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn list_always_includes_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(list_from(dir.path()).unwrap(), vec!["default"]);

        let mut pipeline = defaults::default_pipeline();
        pipeline.id = "staging".to_string();
        save_to(dir.path(), &pipeline).unwrap();

        assert_eq!(list_from(dir.path()).unwrap(), vec!["default", "staging"]);
    }
}
