//! The environment manifest: the named variables downstream tooling reads.
//!
//! The manifest enumerates requirements without supplying real values. A
//! `secret` entry renders as a placeholder that must be replaced before
//! dependent tooling runs; a `setting` entry carries a usable default and is
//! validated by shape instead.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder written into rendered templates for secret entries.
/// `is_placeholder` must recognize it, so an unedited template never passes
/// a check.
pub const TEMPLATE_PLACEHOLDER: &str = "CHANGE_ME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    /// Must be supplied by an operator or secret store; placeholders rejected.
    Secret,
    /// Has a usable default; validated by shape.
    Setting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    #[default]
    Text,
    Port,
    Boolean,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSpec {
    pub name: String,
    pub group: String,
    pub kind: VarKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "shape_is_text")]
    pub shape: ValueShape,
}

fn shape_is_text(shape: &ValueShape) -> bool {
    *shape == ValueShape::Text
}

impl EnvVarSpec {
    pub fn secret(name: &str, group: &str) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            kind: VarKind::Secret,
            default: None,
            shape: ValueShape::Text,
        }
    }

    pub fn setting(name: &str, group: &str, default: &str, shape: ValueShape) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            kind: VarKind::Setting,
            default: Some(default.to_string()),
            shape,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub vars: Vec<EnvVarSpec>,
}

impl Manifest {
    pub fn new(vars: Vec<EnvVarSpec>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for var in &vars {
            if !seen.insert(var.name.clone()) {
                return Err(Error::config_invalid_value(
                    "vars.name",
                    Some(var.name.clone()),
                    "Duplicate variable name in manifest",
                ));
            }
        }
        Ok(Self { vars })
    }

    pub fn groups(&self) -> Vec<String> {
        let mut groups = Vec::new();
        for var in &self.vars {
            if !groups.contains(&var.group) {
                groups.push(var.group.clone());
            }
        }
        groups
    }

    fn group_vars(&self, group: Option<&str>) -> Result<Vec<&EnvVarSpec>> {
        match group {
            None => Ok(self.vars.iter().collect()),
            Some(name) => {
                let vars: Vec<&EnvVarSpec> =
                    self.vars.iter().filter(|v| v.group == name).collect();
                if vars.is_empty() {
                    return Err(Error::env_group_not_found(name, self.groups()));
                }
                Ok(vars)
            }
        }
    }
}

/// Immutable snapshot of an execution context's variables.
///
/// Captured once per invocation; checks and runs read the snapshot, never
/// the live process environment, so a check result describes one consistent
/// state.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            vars: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|s| s.as_str())
    }
}

/// Well-known junk values that mean "nobody filled this in yet".
pub fn is_placeholder(value: &str) -> bool {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        vec![
            Regex::new(
                r"(?i)^(change[-_ ]?me|todo|tbd|fixme|x{3,}|placeholder|password|secret|dummy|example)$",
            )
            .unwrap(),
            Regex::new(r"(?i)^your[-_]").unwrap(),
            Regex::new(r"(?i)^replace([-_]|$)").unwrap(),
            Regex::new(r"^<[^>]*>$").unwrap(),
            Regex::new(r"^\$\{[^}]*\}$").unwrap(),
        ]
    });

    let trimmed = value.trim();
    patterns.iter().any(|p| p.is_match(trimmed))
}

// ============================================================================
// Checking
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Missing,
    Empty,
    Placeholder,
    Invalid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarCheck {
    pub name: String,
    pub group: String,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl VarCheck {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Ok
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub passed: bool,
    pub results: Vec<VarCheck>,
    pub summary: CheckSummary,
}

/// Validate a snapshot against the manifest.
///
/// Every listed variable must be present and non-empty; secrets must not be
/// placeholders; settings must parse per their shape. `group` restricts the
/// check to one group and errors if the group is unknown.
pub fn check(manifest: &Manifest, env: &Environment, group: Option<&str>) -> Result<CheckReport> {
    let vars = manifest.group_vars(group)?;

    let results: Vec<VarCheck> = vars.iter().map(|spec| check_var(spec, env)).collect();

    let passed = results.iter().filter(|r| r.passed()).count();
    let failed = results.len() - passed;

    Ok(CheckReport {
        passed: failed == 0,
        summary: CheckSummary {
            total: results.len(),
            passed,
            failed,
        },
        results,
    })
}

fn check_var(spec: &EnvVarSpec, env: &Environment) -> VarCheck {
    let result = |status, problem: Option<String>| VarCheck {
        name: spec.name.clone(),
        group: spec.group.clone(),
        status,
        problem,
    };

    let Some(value) = env.get(&spec.name) else {
        return result(CheckStatus::Missing, Some("Not set".to_string()));
    };

    if value.trim().is_empty() {
        return result(CheckStatus::Empty, Some("Set but empty".to_string()));
    }

    match spec.kind {
        VarKind::Secret => {
            if is_placeholder(value) {
                return result(
                    CheckStatus::Placeholder,
                    Some("Still a placeholder value".to_string()),
                );
            }
        }
        VarKind::Setting => {
            if let Some(problem) = shape_problem(spec.shape, value) {
                return result(CheckStatus::Invalid, Some(problem));
            }
        }
    }

    result(CheckStatus::Ok, None)
}

fn shape_problem(shape: ValueShape, value: &str) -> Option<String> {
    match shape {
        ValueShape::Text => None,
        ValueShape::Port => match value.trim().parse::<u16>() {
            Ok(0) => Some("Port cannot be 0".to_string()),
            Ok(_) => None,
            Err(_) => Some(format!("'{}' is not a valid port", value.trim())),
        },
        ValueShape::Boolean => {
            let normalized = value.trim().to_ascii_lowercase();
            if normalized == "true" || normalized == "false" {
                None
            } else {
                Some(format!("'{}' is not true/false", value.trim()))
            }
        }
    }
}

// ============================================================================
// Template rendering
// ============================================================================

/// Render the staging template: shell export lines, placeholders for
/// secrets, defaults for settings. Never reads the live environment.
pub fn render_template(manifest: &Manifest) -> String {
    let mut out = String::from(
        "#!/bin/sh\n\
         # Environment staging template.\n\
         # Replace every CHANGE_ME before running dependent tooling.\n",
    );

    for group in manifest.groups() {
        out.push_str(&format!("\n# {}\n", group));
        for var in manifest.vars.iter().filter(|v| v.group == group) {
            let value = match var.kind {
                VarKind::Secret => TEMPLATE_PLACEHOLDER,
                VarKind::Setting => var.default.as_deref().unwrap_or(TEMPLATE_PLACEHOLDER),
            };
            out.push_str(&format!("export {}=\"{}\"\n", var.name, value));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;

    fn staged_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DT_SQL_TESTUSER", "ci_user"),
            ("DT_SQL_TESTPASS", "s3cret-pw"),
            ("DT_SQL_TESTHOST", "localhost"),
            ("DT_SQL_TESTPORT", "5432"),
            ("DT_SQL_TESTDBNAME", "dtbase_testdb"),
            ("DT_DOCKER_USER", "ci-bot"),
            ("DT_DOCKER_PASS", "registry-pw"),
            ("DT_OPENWEATHERMAP_APIKEY", "7bb227e87d064e2294578a2bc8e358b3"),
            ("DT_HYPER_APIKEY", "hyper-8d1f2"),
            ("AZURE_STORAGE_ACCOUNT", "cistateacct"),
            ("AZURE_STORAGE_KEY", "k3y=="),
            ("AZURE_KEYVAULT_AUTH_VIA_CLI", "true"),
            ("DT_CONFIG_MODE", "Test"),
        ]
    }

    #[test]
    fn placeholder_detection_catches_common_junk() {
        for junk in [
            "CHANGE_ME",
            "changeme",
            "change-me",
            "TODO",
            "xxx",
            "XXXX",
            "<your key here>",
            "${SECRET}",
            "your_api_key",
            "replace_with_real_key",
        ] {
            assert!(is_placeholder(junk), "{} should be a placeholder", junk);
        }
    }

    #[test]
    fn placeholder_detection_accepts_real_values() {
        for real in ["s3cret-pw", "7bb227e87d064e2294578a2bc8e358b3", "ci-bot"] {
            assert!(!is_placeholder(real), "{} should pass", real);
        }
    }

    #[test]
    fn fully_staged_environment_passes() {
        let manifest = defaults::default_manifest();
        let env = Environment::from_pairs(&staged_pairs());

        let report = check(&manifest, &env, None).unwrap();
        assert!(report.passed, "failures: {:?}", report.results);
        assert_eq!(report.summary.failed, 0);
        assert_eq!(report.summary.total, manifest.vars.len());
    }

    #[test]
    fn missing_variable_fails_check() {
        let manifest = defaults::default_manifest();
        let mut pairs = staged_pairs();
        pairs.retain(|(name, _)| *name != "DT_HYPER_APIKEY");
        let env = Environment::from_pairs(&pairs);

        let report = check(&manifest, &env, None).unwrap();
        assert!(!report.passed);
        let failure = report.results.iter().find(|r| !r.passed()).unwrap();
        assert_eq!(failure.name, "DT_HYPER_APIKEY");
        assert_eq!(failure.status, CheckStatus::Missing);
    }

    #[test]
    fn placeholder_secret_fails_check() {
        let manifest = defaults::default_manifest();
        let mut pairs = staged_pairs();
        for pair in pairs.iter_mut() {
            if pair.0 == "DT_DOCKER_PASS" {
                pair.1 = "CHANGE_ME";
            }
        }
        let env = Environment::from_pairs(&pairs);

        let report = check(&manifest, &env, None).unwrap();
        let failure = report
            .results
            .iter()
            .find(|r| r.name == "DT_DOCKER_PASS")
            .unwrap();
        assert_eq!(failure.status, CheckStatus::Placeholder);
    }

    #[test]
    fn bad_port_setting_fails_check() {
        let manifest = defaults::default_manifest();
        let mut pairs = staged_pairs();
        for pair in pairs.iter_mut() {
            if pair.0 == "DT_SQL_TESTPORT" {
                pair.1 = "54p2";
            }
        }
        let env = Environment::from_pairs(&pairs);

        let report = check(&manifest, &env, None).unwrap();
        let failure = report
            .results
            .iter()
            .find(|r| r.name == "DT_SQL_TESTPORT")
            .unwrap();
        assert_eq!(failure.status, CheckStatus::Invalid);
    }

    #[test]
    fn group_filter_restricts_check() {
        let manifest = defaults::default_manifest();
        // Only the registry pair set; everything else absent.
        let env = Environment::from_pairs(&[
            ("DT_DOCKER_USER", "ci-bot"),
            ("DT_DOCKER_PASS", "registry-pw"),
        ]);

        let report = check(&manifest, &env, Some(defaults::GROUP_REGISTRY)).unwrap();
        assert!(report.passed);
        assert_eq!(report.summary.total, 2);
    }

    #[test]
    fn unknown_group_is_an_error() {
        let manifest = defaults::default_manifest();
        let env = Environment::from_pairs(&[]);
        let err = check(&manifest, &env, Some("nonsense")).unwrap_err();
        assert_eq!(err.code.as_str(), "env.group_not_found");
    }

    #[test]
    fn manifest_rejects_duplicate_names() {
        let err = Manifest::new(vec![
            EnvVarSpec::secret("DT_DOCKER_USER", "registry"),
            EnvVarSpec::secret("DT_DOCKER_USER", "registry"),
        ])
        .unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn rendered_template_lists_every_variable() {
        let manifest = defaults::default_manifest();
        let rendered = render_template(&manifest);

        for var in &manifest.vars {
            assert!(
                rendered.contains(&format!("export {}=", var.name)),
                "{} missing from template",
                var.name
            );
        }
    }

    #[test]
    fn unedited_template_never_passes_a_check() {
        let manifest = defaults::default_manifest();
        let rendered = render_template(&manifest);

        // Parse the rendered exports back into an environment snapshot.
        let pairs: Vec<(String, String)> = rendered
            .lines()
            .filter_map(|line| line.strip_prefix("export "))
            .filter_map(|line| {
                let (name, value) = line.split_once('=')?;
                Some((name.to_string(), value.trim_matches('"').to_string()))
            })
            .collect();
        let refs: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let env = Environment::from_pairs(&refs);

        let report = check(&manifest, &env, None).unwrap();
        assert!(!report.passed);
        // Exactly the secrets fail; settings carry usable defaults.
        let secret_count = manifest
            .vars
            .iter()
            .filter(|v| v.kind == VarKind::Secret)
            .count();
        assert_eq!(report.summary.failed, secret_count);
    }
}
