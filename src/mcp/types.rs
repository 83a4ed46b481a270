//! Request and response types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{Feature, ProgressEntry};

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFeaturesRequest {
    #[schemars(description = "Optional status filter: 'failing', 'in_progress', or 'passing'")]
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddFeatureRequest {
    #[schemars(description = "Short name of the feature, e.g. 'Login'")]
    pub name: String,
    #[schemars(description = "What the feature must do to count as passing")]
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FeatureIdRequest {
    #[schemars(description = "The numeric id of the feature")]
    pub feature_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LogProgressRequest {
    #[schemars(
        description = "Entry type: 'started', 'completed', 'checkpoint', 'note', or 'blocker'"
    )]
    pub entry_type: String,
    #[schemars(description = "What happened, in one line")]
    pub message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadProgressRequest {
    #[schemars(description = "How many of the most recent entries to return (default 20)")]
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckpointRequest {
    #[schemars(description = "Commit message describing the work being checkpointed")]
    pub message: String,
}

// ============================================================
// Response Types
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub status: String,
}

impl From<Feature> for FeatureInfo {
    fn from(f: Feature) -> Self {
        Self {
            id: f.id,
            name: f.name,
            description: f.description,
            status: f.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureListResponse {
    pub features: Vec<FeatureInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NextFeatureResponse {
    /// `None` when every feature passes or none exist.
    pub feature: Option<FeatureInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressEntryInfo {
    pub timestamp: String,
    pub entry_type: String,
    pub message: String,
}

impl From<ProgressEntry> for ProgressEntryInfo {
    fn from(e: ProgressEntry) -> Self {
        Self {
            timestamp: e.timestamp.to_rfc3339(),
            entry_type: e.entry_type.as_str().to_string(),
            message: e.message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressListResponse {
    pub entries: Vec<ProgressEntryInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointResponse {
    pub committed: bool,
    pub commit_hash: Option<String>,
    pub message: String,
}
