use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base dockhand config directory (universal ~/.config/dockhand/ on all platforms)
pub fn dockhand() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows")
        })?;
        Ok(PathBuf::from(appdata).join("dockhand"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected("HOME environment variable not set on Unix-like system")
        })?;
        Ok(PathBuf::from(home).join(".config").join("dockhand"))
    }
}

/// Global dockhand.json config file path
pub fn dockhand_json() -> Result<PathBuf> {
    Ok(dockhand()?.join("dockhand.json"))
}

/// Pipelines directory
pub fn pipelines() -> Result<PathBuf> {
    Ok(dockhand()?.join("pipelines"))
}

/// Pipeline config file path
pub fn pipeline(id: &str) -> Result<PathBuf> {
    Ok(pipelines()?.join(format!("{}.json", id)))
}
