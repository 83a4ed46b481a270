//! Per-project harness configuration, stored in `.claude/harness-config.json`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How strictly the feature-focus guard treats edits made with no feature
/// in progress.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    /// Block the edit.
    Strict,
    /// Warn, but let the edit through.
    #[default]
    Standard,
    /// Say nothing.
    Relaxed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessConfig {
    #[serde(default)]
    pub mode: EnforcementMode,
    #[serde(default = "default_true")]
    pub feature_enforcement: bool,
    /// Commits shown in the session-start context.
    #[serde(default = "default_commit_history")]
    pub commit_history: usize,
    /// Progress entries shown in the session-start context.
    #[serde(default = "default_progress_tail")]
    pub progress_tail: usize,
    /// Unfinished features listed as next priority items.
    #[serde(default = "default_upcoming_features")]
    pub upcoming_features: usize,
    /// Recent progress entries the stop reminder scans for completions.
    #[serde(default = "default_reminder_window")]
    pub reminder_window: usize,
    /// Script in the project root run at session start, if it exists.
    #[serde(default = "default_startup_script")]
    pub startup_script: String,
}

fn default_true() -> bool {
    true
}

fn default_commit_history() -> usize {
    10
}

fn default_progress_tail() -> usize {
    20
}

fn default_upcoming_features() -> usize {
    5
}

fn default_reminder_window() -> usize {
    10
}

fn default_startup_script() -> String {
    "init.sh".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: EnforcementMode::default(),
            feature_enforcement: true,
            commit_history: default_commit_history(),
            progress_tail: default_progress_tail(),
            upcoming_features: default_upcoming_features(),
            reminder_window: default_reminder_window(),
            startup_script: default_startup_script(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from `path`.
    /// Returns the defaults if the file doesn't exist or fails to parse.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save the configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}
