use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    pub addr: Option<String>,
    pub token: Option<String>,
    pub log_level: Option<String>,
}

impl ProfileConfig {
    /// Sets a key by name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let slot = match key {
            "addr" => &mut self.addr,
            "token" => &mut self.token,
            "log_level" => &mut self.log_level,
            other => {
                anyhow::bail!("Unknown config key: {other}. Valid keys: addr, token, log_level")
            }
        };
        *slot = Some(value.to_string());
        Ok(())
    }
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".authsync");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_all_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

pub fn load_profile_from(path: &Path, profile: &str) -> Result<ProfileConfig> {
    Ok(load_all_from(path)?.remove(profile).unwrap_or_default())
}

pub fn save_profile_to(path: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all_from(path)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    load_profile_from(&config_path()?, profile)
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_profile_to(&config_path()?, profile, config)
}

pub fn resolve_addr(cli_addr: Option<&str>, profile: &ProfileConfig) -> Result<String> {
    // 1. --addr flag / AUTHSYNC_ADDR env
    if let Some(addr) = cli_addr {
        return Ok(addr.to_string());
    }
    // 2. config.toml profile
    if let Some(addr) = &profile.addr {
        return Ok(addr.clone());
    }
    anyhow::bail!(
        "No auth service address configured. \
         Use --addr, set AUTHSYNC_ADDR, or run: authsync config set addr <url>"
    )
}
