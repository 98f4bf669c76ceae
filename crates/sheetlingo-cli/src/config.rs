//! Optional TOML configuration for the CLI

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Contents of `config.toml`; every key is optional and flags win
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rewrite endpoint URLs, tried in order
    pub endpoints: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    /// Base URL of the whole-file job service
    pub job_server: Option<String>,
    pub poll_interval_ms: Option<u64>,
    /// Extra glossary, TOML or JSON
    pub glossary: Option<PathBuf>,
    pub preserve_english: Option<bool>,
    pub keep_originals: Option<bool>,
}

impl Config {
    /// `<config_dir>/sheetlingo/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetlingo")
            .join("config.toml")
    }

    /// Load an explicit file, or the default one when it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config '{}'", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms.map(Duration::from_millis)
    }
}
