use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "apilab.json";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ApilabConfig {
    #[serde(rename = "proxyBase")]
    pub proxy_base: Option<String>,
    #[serde(rename = "mockDelayMs")]
    pub mock_delay_ms: Option<u64>,
    /// `0` disables the timeout.
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
    /// `0` keeps every entry.
    #[serde(rename = "historyCapacity")]
    pub history_capacity: Option<usize>,
    pub catalog: Option<String>,
    pub env: Option<String>,
    #[serde(rename = "includeBuiltin")]
    pub include_builtin: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ApilabConfig,
    pub path: PathBuf,
    pub dir: PathBuf,
}

pub fn load_config(target: &Path) -> Result<Option<LoadedConfig>> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(CONFIG_FILE_NAME), resolved)
    } else {
        let dir = match resolved.parent() {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()?,
        };
        (resolved, dir)
    };

    if !file_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading config {}", file_path.display()))?;

    let config: ApilabConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", file_path.display()))?;

    Ok(Some(LoadedConfig {
        config,
        path: file_path,
        dir,
    }))
}
