//! Local state and desired-state files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use authsync_core::ConfigMap;

/// What the CLI remembers about the auth method it manages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub id: String,
    #[serde(default)]
    pub attributes: ConfigMap,
}

/// Loads the state file; a missing file means nothing is tracked yet.
pub fn load(path: &Path) -> Result<Option<StateFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read state file {}", path.display()))?;
    let state = serde_json::from_str(&content)
        .with_context(|| format!("Invalid state file {}", path.display()))?;
    Ok(Some(state))
}

pub fn save(path: &Path, state: &StateFile) -> Result<()> {
    let content = serde_json::to_string_pretty(state)?;
    fs::write(path, content).with_context(|| format!("Cannot write state file {}", path.display()))
}

pub fn remove(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Cannot remove state file {}", path.display()))?;
    }
    Ok(())
}

/// Reads a desired-state TOML file into a flat configuration map.
pub fn load_desired(path: &Path) -> Result<ConfigMap> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read desired state {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid desired state {}", path.display()))
}
