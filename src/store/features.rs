use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use super::{FileStorage, MemoryStorage, Storage};
use crate::error::{Error, Result};
use crate::models::*;

/// The feature checklist, persisted as one JSON document.
///
/// Every mutation loads the whole checklist, changes it in memory and writes
/// it back in one piece. Nothing is locked, so concurrent writers race and
/// the last write wins.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    storage: Arc<dyn Storage>,
}

impl FeatureStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(path)))
    }

    pub fn open_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn location(&self) -> String {
        self.storage.location()
    }

    // ============================================================
    // Persistence
    // ============================================================

    /// Load the checklist. A document that does not exist yet is an empty
    /// checklist; one that does not parse is an error.
    pub fn load(&self) -> Result<Checklist> {
        let contents = self.storage.load().map_err(|source| Error::Io {
            location: self.location(),
            source,
        })?;

        let Some(contents) = contents else {
            tracing::debug!("No checklist at {}, starting empty", self.location());
            return Ok(Checklist::default());
        };

        if contents.trim().is_empty() {
            return Ok(Checklist::default());
        }

        let mut checklist: Checklist =
            serde_json::from_str(&contents).map_err(|e| Error::Malformed {
                location: self.location(),
                reason: e.to_string(),
            })?;
        checklist.normalize();
        Ok(checklist)
    }

    fn save(&self, checklist: &Checklist) -> Result<()> {
        let json = serde_json::to_string_pretty(checklist).map_err(|e| Error::Malformed {
            location: self.location(),
            reason: e.to_string(),
        })?;
        self.storage
            .replace(&format!("{}\n", json))
            .map_err(|source| Error::Io {
                location: self.location(),
                source,
            })?;
        tracing::debug!(
            "Wrote {} features to {}",
            checklist.features.len(),
            self.location()
        );
        Ok(())
    }

    /// Write an empty checklist if none exists yet. Returns whether one was
    /// created.
    pub fn ensure_exists(&self) -> Result<bool> {
        let existing = self.storage.load().map_err(|source| Error::Io {
            location: self.location(),
            source,
        })?;
        if existing.is_some() {
            return Ok(false);
        }
        self.save(&Checklist::default())?;
        Ok(true)
    }

    // ============================================================
    // Operations
    // ============================================================

    /// Add a feature in the `Failing` state and return its id.
    pub fn add(&self, name: &str, description: &str) -> Result<u64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation(
                "Feature name must not be empty".to_string(),
            ));
        }

        let mut checklist = self.load()?;
        let id = checklist.add(name, description.trim(), Utc::now());
        self.save(&checklist)?;

        tracing::info!("Added feature {} ({})", id, name);
        Ok(id)
    }

    /// Set the status of a feature.
    ///
    /// Transitions are not checked against the intended
    /// failing → in_progress → passing order; any status may be set from any
    /// other. Callers that want a stricter workflow enforce it themselves.
    pub fn transition(&self, id: u64, status: FeatureStatus) -> Result<Feature> {
        let mut checklist = self.load()?;
        let feature = checklist
            .set_status(id, status, Utc::now())
            .cloned()
            .ok_or(Error::NotFound(id))?;
        self.save(&checklist)?;

        tracing::info!("Feature {} ({}) is now {}", id, feature.name, status);
        Ok(feature)
    }

    /// All features in insertion order.
    pub fn list(&self) -> Result<Vec<Feature>> {
        Ok(self.load()?.features)
    }

    pub fn get(&self, id: u64) -> Result<Option<Feature>> {
        Ok(self.load()?.get(id).cloned())
    }

    /// The feature to work on next: the earliest-added one that is not
    /// passing.
    pub fn next_priority(&self) -> Result<Option<Feature>> {
        Ok(self.load()?.next_priority().cloned())
    }

    /// The feature currently in progress, if any.
    pub fn current(&self) -> Result<Option<Feature>> {
        Ok(self.load()?.current().cloned())
    }

    pub fn upcoming(&self, limit: usize) -> Result<Vec<Feature>> {
        Ok(self
            .load()?
            .upcoming(limit)
            .into_iter()
            .cloned()
            .collect())
    }
}
