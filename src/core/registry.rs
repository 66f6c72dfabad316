//! Registry authentication and push command construction.

use crate::environment::{self, Environment};
use crate::error::{Error, Result};

pub const DOCKER_PROGRAM: &str = "docker";

pub const USERNAME_VAR: &str = "DT_DOCKER_USER";
pub const PASSWORD_VAR: &str = "DT_DOCKER_PASS";

/// Registry credentials pulled from the staged environment.
#[derive(Clone)]
pub struct RegistryCredentials {
    pub username: String,
    password: String,
}

impl RegistryCredentials {
    pub fn password(&self) -> &str {
        &self.password
    }
}

// The password must never reach debug output or recorded commands.
impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read both credential values from the environment snapshot.
///
/// A placeholder credential is rejected here rather than handed to the
/// registry, so the failure names the variable instead of echoing a login
/// error.
pub fn credentials_from(env: &Environment) -> Result<RegistryCredentials> {
    let username = require_credential(env, USERNAME_VAR)?;
    let password = require_credential(env, PASSWORD_VAR)?;
    Ok(RegistryCredentials { username, password })
}

fn require_credential(env: &Environment, name: &str) -> Result<String> {
    let value = env
        .get(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            Error::config_missing_key(name, None)
                .with_hint("Run 'dockhand env check --group registry' to see what is staged")
        })?;

    if environment::is_placeholder(value) {
        return Err(Error::config_invalid_value(
            name,
            None,
            "Credential is still a placeholder value",
        ));
    }

    Ok(value.to_string())
}

/// Argv for the registry login. The password travels via stdin.
pub fn login_args(registry: Option<&str>, username: &str) -> Vec<String> {
    let mut args = vec![
        "login".to_string(),
        "-u".to_string(),
        username.to_string(),
        "--password-stdin".to_string(),
    ];
    if let Some(host) = registry {
        args.push(host.to_string());
    }
    args
}

/// Argv for publishing a tagged image.
pub fn push_args(reference: &str) -> Vec<String> {
    vec!["push".to_string(), reference.to_string()]
}
