//! On-disk layout of a harnessed project, plus the operations that touch more
//! than one store.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::models::*;
use crate::store::{FeatureStore, ProgressLog};
use crate::summary::Summarizer;
use crate::vcs::{CommitOutcome, VersionControl};

pub const FEATURES_FILE: &str = "claude-features.json";
pub const PROGRESS_FILE: &str = "claude-progress.txt";
pub const STATE_DIR: &str = ".claude";
pub const INIT_MARKER: &str = ".claude-harness-initialized";
pub const CONFIG_FILE: &str = "harness-config.json";

/// A project directory and the harness state kept inside it.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    features: FeatureStore,
    progress: ProgressLog,
    config: HarnessConfig,
}

/// What `init` found and created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub already_initialized: bool,
    pub created: Vec<String>,
}

impl Project {
    /// Open the project rooted at `root`, using the standard file names.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config = HarnessConfig::load(&root.join(STATE_DIR).join(CONFIG_FILE));
        Self {
            features: FeatureStore::open(root.join(FEATURES_FILE)),
            progress: ProgressLog::open(root.join(PROGRESS_FILE)),
            root,
            config,
        }
    }

    /// Assemble a project from explicit stores, e.g. in-memory ones.
    pub fn with_stores(
        root: impl Into<PathBuf>,
        features: FeatureStore,
        progress: ProgressLog,
        config: HarnessConfig,
    ) -> Self {
        Self {
            root: root.into(),
            features,
            progress,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }

    pub fn progress(&self) -> &ProgressLog {
        &self.progress
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn marker_path(&self) -> PathBuf {
        self.root.join(STATE_DIR).join(INIT_MARKER)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(STATE_DIR).join(CONFIG_FILE)
    }

    /// Whether the project has opted in. Only the marker's presence counts.
    pub fn is_initialized(&self) -> bool {
        self.marker_path().exists()
    }

    pub fn summarizer(&self) -> Summarizer {
        Summarizer::new(self.features.clone(), self.progress.clone())
            .with_upcoming_limit(self.config.upcoming_features)
    }

    /// Set up harness state. Safe to run again: existing files are left
    /// untouched.
    pub fn init(&self) -> Result<InitReport> {
        let mut report = InitReport {
            already_initialized: self.is_initialized(),
            created: Vec::new(),
        };

        let marker = self.marker_path();
        if !report.already_initialized {
            if let Some(parent) = marker.parent() {
                fs::create_dir_all(parent).map_err(|source| Error::Io {
                    location: parent.display().to_string(),
                    source,
                })?;
            }
            fs::write(&marker, "").map_err(|source| Error::Io {
                location: marker.display().to_string(),
                source,
            })?;
            report.created.push(format!("{}/{}", STATE_DIR, INIT_MARKER));
        }

        let config_path = self.config_path();
        if !config_path.exists() {
            self.config.save(&config_path).map_err(|e| Error::Config {
                location: config_path.display().to_string(),
                reason: format!("{:#}", e),
            })?;
            report.created.push(format!("{}/{}", STATE_DIR, CONFIG_FILE));
        }

        if self.features.ensure_exists()? {
            report.created.push(FEATURES_FILE.to_string());
        }
        if self.progress.ensure_exists()? {
            report.created.push(PROGRESS_FILE.to_string());
        }

        if !report.already_initialized {
            self.progress
                .append(EntryType::Note, "Harness initialized")?;
        }

        tracing::info!(
            "Initialized harness in {} (created: {:?})",
            self.root.display(),
            report.created
        );
        Ok(report)
    }

    /// Move a feature to `status` and record the move in the progress log:
    /// `started` for in progress, `completed` for passing, a note for
    /// failing.
    pub fn set_feature_status(&self, id: u64, status: FeatureStatus) -> Result<Feature> {
        let feature = self.features.transition(id, status)?;
        match status {
            FeatureStatus::InProgress => self.progress.append(EntryType::Started, &feature.name)?,
            FeatureStatus::Passing => self.progress.append(EntryType::Completed, &feature.name)?,
            FeatureStatus::Failing => self
                .progress
                .append(EntryType::Note, &format!("{} needs more work", feature.name))?,
        };
        Ok(feature)
    }

    /// Log a checkpoint entry, then commit everything, log included.
    pub fn checkpoint(&self, vcs: &dyn VersionControl, message: &str) -> Result<CommitOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::Validation(
                "Checkpoint message must not be empty".to_string(),
            ));
        }

        self.progress.append(EntryType::Checkpoint, message)?;
        let outcome = vcs.commit(message)?;
        Ok(outcome)
    }
}
