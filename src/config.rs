use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};
use crate::backend::BackendSettings;

const DEFAULT_DELAY_MS: u64 = 1500;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    /// Question bank to draw from: "general", "behavioral", or "technical"
    pub interview_kind: Option<String>,
    pub connect_delay_ms: Option<u64>,
    pub think_delay_ms: Option<u64>,
    pub backend: Option<BackendSettings>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            user_name: None,
            user_id: None,
            interview_kind: None,
            connect_delay_ms: None,
            think_delay_ms: None,
            backend: None,
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Simulated connection latency before a call goes live
    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms.unwrap_or(DEFAULT_DELAY_MS))
    }

    /// Simulated thinking time before an interviewer reply
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms.unwrap_or(DEFAULT_DELAY_MS))
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("interview-cli").join("config.json"))
    }
}
