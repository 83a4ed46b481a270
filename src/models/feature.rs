use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked unit of work the agent is expected to make pass.
///
/// Features are never deleted. Once added they stay on the checklist and only
/// their status moves, so the checklist doubles as a record of everything the
/// project set out to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: FeatureStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The lifecycle status of a feature.
///
/// The intended flow is `Failing` → `InProgress` → `Passing`, with
/// `Passing`/`InProgress` → `Failing` when a feature needs more work.
/// None of this is enforced: any status may be set from any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Failing,
    InProgress,
    Passing,
}

impl FeatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failing => "failing",
            Self::InProgress => "in_progress",
            Self::Passing => "passing",
        }
    }

    /// Marker used when listing features in plain text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Failing => "[FAILING]",
            Self::InProgress => "[IN PROGRESS]",
            Self::Passing => "[PASSING]",
        }
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "failing" => Ok(Self::Failing),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "passing" => Ok(Self::Passing),
            other => Err(format!(
                "Invalid status '{}'. Must be: failing, in_progress, or passing",
                other
            )),
        }
    }
}

/// The persisted feature checklist: the features in insertion order plus the
/// id counter.
///
/// `next_id` only ever grows, so ids are never reused even though features
/// are never deleted either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    #[serde(default = "first_id")]
    pub next_id: u64,
    #[serde(default)]
    pub features: Vec<Feature>,
}

fn first_id() -> u64 {
    1
}

impl Default for Checklist {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            features: Vec::new(),
        }
    }
}

impl Checklist {
    /// Raise `next_id` above every id already present.
    ///
    /// A hand-edited file can leave the counter behind the records it
    /// guards; allocation must still never hand out a taken id.
    pub fn normalize(&mut self) {
        let floor = self
            .features
            .iter()
            .map(|f| f.id + 1)
            .max()
            .unwrap_or(1)
            .max(1);
        if self.next_id < floor {
            self.next_id = floor;
        }
    }

    /// Append a new `Failing` feature and return its id.
    pub fn add(&mut self, name: &str, description: &str, now: DateTime<Utc>) -> u64 {
        self.normalize();
        let id = self.next_id;
        self.next_id += 1;
        self.features.push(Feature {
            id,
            name: name.to_string(),
            description: description.to_string(),
            status: FeatureStatus::Failing,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn get(&self, id: u64) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Set the status of feature `id`. Returns `None` if there is no such
    /// feature, in which case nothing changes.
    pub fn set_status(
        &mut self,
        id: u64,
        status: FeatureStatus,
        now: DateTime<Utc>,
    ) -> Option<&Feature> {
        let feature = self.features.iter_mut().find(|f| f.id == id)?;
        feature.status = status;
        feature.updated_at = now;
        Some(feature)
    }

    /// The first feature, by insertion order, that is not yet passing.
    pub fn next_priority(&self) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.status != FeatureStatus::Passing)
    }

    /// The first feature currently marked in progress.
    pub fn current(&self) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.status == FeatureStatus::InProgress)
    }

    /// Up to `limit` features that still need work, in insertion order.
    pub fn upcoming(&self, limit: usize) -> Vec<&Feature> {
        self.features
            .iter()
            .filter(|f| f.status != FeatureStatus::Passing)
            .take(limit)
            .collect()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for feature in &self.features {
            match feature.status {
                FeatureStatus::Failing => counts.failing += 1,
                FeatureStatus::InProgress => counts.in_progress += 1,
                FeatureStatus::Passing => counts.passing += 1,
            }
        }
        counts
    }
}

/// Number of features in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub failing: usize,
    pub in_progress: usize,
    pub passing: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.failing + self.in_progress + self.passing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            FeatureStatus::Failing,
            FeatureStatus::InProgress,
            FeatureStatus::Passing,
        ] {
            assert_eq!(status.as_str().parse::<FeatureStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_status_rejects_unknown() {
        let err = "done".parse::<FeatureStatus>().unwrap_err();
        assert!(err.contains("done"));
    }

    #[test]
    fn test_normalize_raises_stale_counter() {
        let now = Utc::now();
        let mut checklist = Checklist::default();
        checklist.add("A", "", now);
        checklist.add("B", "", now);
        checklist.next_id = 1;

        let id = checklist.add("C", "", now);
        assert_eq!(id, 3);
    }

    #[test]
    fn test_counter_survives_serialization() {
        let now = Utc::now();
        let mut checklist = Checklist::default();
        checklist.add("A", "first", now);

        let json = serde_json::to_string(&checklist).unwrap();
        assert!(json.contains("\"next_id\":2"));
        assert!(json.contains("\"status\":\"failing\""));

        let parsed: Checklist = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, checklist);
    }

    #[test]
    fn test_missing_description_defaults_to_empty() {
        let json = r#"{"next_id":2,"features":[{"id":1,"name":"Login","status":"in_progress",
            "created_at":"2026-01-01T00:00:00Z","updated_at":"2026-01-01T00:00:00Z"}]}"#;
        let parsed: Checklist = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.features[0].description, "");
        assert_eq!(parsed.current().map(|f| f.id), Some(1));
    }
}
