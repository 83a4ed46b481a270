//! MCP server exposing the feature checklist and progress log as tools.
//!
//! The same operations as the `harness` command line, reachable from an
//! agent over stdio without shelling out.

mod types;

use std::sync::Arc;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;

use crate::error::Error;
use crate::models::*;
use crate::project::Project;
use crate::vcs::{CommitOutcome, VersionControl};

/// Entries returned by `read_progress` when no limit is given.
const DEFAULT_PROGRESS_LIMIT: usize = 20;

#[derive(Clone)]
pub struct HarnessMcpServer {
    project: Project,
    vcs: Arc<dyn VersionControl>,
    tool_router: ToolRouter<Self>,
}

impl HarnessMcpServer {
    pub fn new(project: Project, vcs: Arc<dyn VersionControl>) -> Self {
        Self {
            project,
            vcs,
            tool_router: Self::tool_router(),
        }
    }

    fn harness_err(e: Error) -> McpError {
        match e {
            Error::Validation(_) | Error::NotFound(_) => {
                McpError::invalid_params(e.to_string(), None)
            }
            _ => {
                tracing::error!("Tool failed: {}", e);
                McpError::internal_error(e.to_string(), None)
            }
        }
    }

    fn json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    fn parse_status(s: &str) -> Result<FeatureStatus, McpError> {
        s.parse::<FeatureStatus>()
            .map_err(|e| McpError::invalid_params(e, None))
    }

    // ============================================================
    // Tool logic, shared by the tools and the test helpers
    // ============================================================

    pub fn test_get_status(&self) -> String {
        let status = self.project.summarizer().status();
        let upcoming = status.render_upcoming();
        if upcoming.is_empty() {
            status.render()
        } else {
            format!("{}\n\n{}", status.render(), upcoming.trim_end())
        }
    }

    pub fn test_list_features(
        &self,
        status: Option<&str>,
    ) -> Result<FeatureListResponse, McpError> {
        let filter = status.map(Self::parse_status).transpose()?;
        let features = self
            .project
            .features()
            .list()
            .map_err(Self::harness_err)?
            .into_iter()
            .filter(|f| filter.map_or(true, |s| f.status == s))
            .map(FeatureInfo::from)
            .collect();
        Ok(FeatureListResponse { features })
    }

    pub fn test_next_feature(&self) -> Result<NextFeatureResponse, McpError> {
        let feature = self
            .project
            .features()
            .next_priority()
            .map_err(Self::harness_err)?;
        Ok(NextFeatureResponse {
            feature: feature.map(FeatureInfo::from),
        })
    }

    pub fn test_add_feature(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<FeatureInfo, McpError> {
        let features = self.project.features();
        let id = features
            .add(name, description.unwrap_or_default())
            .map_err(Self::harness_err)?;
        features
            .get(id)
            .map_err(Self::harness_err)?
            .map(FeatureInfo::from)
            .ok_or_else(|| McpError::internal_error("Feature vanished after creation", None))
    }

    pub fn test_set_status(
        &self,
        feature_id: u64,
        status: FeatureStatus,
    ) -> Result<FeatureInfo, McpError> {
        self.project
            .set_feature_status(feature_id, status)
            .map(FeatureInfo::from)
            .map_err(Self::harness_err)
    }

    pub fn test_log_progress(
        &self,
        entry_type: &str,
        message: &str,
    ) -> Result<ProgressEntryInfo, McpError> {
        let entry_type = entry_type
            .parse::<EntryType>()
            .map_err(|e| McpError::invalid_params(e, None))?;
        self.project
            .progress()
            .append(entry_type, message)
            .map(ProgressEntryInfo::from)
            .map_err(Self::harness_err)
    }

    pub fn test_read_progress(
        &self,
        limit: Option<usize>,
    ) -> Result<ProgressListResponse, McpError> {
        let entries = self
            .project
            .progress()
            .tail(limit.unwrap_or(DEFAULT_PROGRESS_LIMIT))
            .map_err(Self::harness_err)?;
        Ok(ProgressListResponse {
            entries: entries.into_iter().map(ProgressEntryInfo::from).collect(),
        })
    }

    pub fn test_checkpoint(&self, message: &str) -> Result<CheckpointResponse, McpError> {
        let outcome = self
            .project
            .checkpoint(self.vcs.as_ref(), message)
            .map_err(Self::harness_err)?;
        Ok(match outcome {
            CommitOutcome::Committed { hash } => CheckpointResponse {
                committed: true,
                commit_hash: Some(hash),
                message: message.trim().to_string(),
            },
            CommitOutcome::NothingToCommit => CheckpointResponse {
                committed: false,
                commit_hash: None,
                message: "nothing to commit".to_string(),
            },
        })
    }
}

#[tool_router]
impl HarnessMcpServer {
    // ============================================================
    // Status Tools
    // ============================================================

    #[tool(
        description = "Get a digest of the project: feature counts by status, the next priority feature, the most recent progress entry, and the list of unfinished features. Call this at the start of work to orient yourself."
    )]
    async fn get_status(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            self.test_get_status(),
        )]))
    }

    #[tool(
        description = "List features in the order they were added, optionally filtered by status (failing, in_progress, passing)."
    )]
    async fn list_features(
        &self,
        params: Parameters<ListFeaturesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        Self::json(&self.test_list_features(req.status.as_deref())?)
    }

    #[tool(
        description = "Get the feature to work on next: the earliest-added feature that is not passing. Returns null when every feature passes."
    )]
    async fn next_feature(&self) -> Result<CallToolResult, McpError> {
        Self::json(&self.test_next_feature()?)
    }

    // ============================================================
    // Feature Tools
    // ============================================================

    #[tool(
        description = "Add a feature to the checklist. New features start as 'failing' until work on them is verified."
    )]
    async fn add_feature(
        &self,
        params: Parameters<AddFeatureRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        Self::json(&self.test_add_feature(&req.name, req.description.as_deref())?)
    }

    #[tool(
        description = "Start working on a feature: marks it 'in_progress' and logs a 'started' entry. Work on one feature at a time."
    )]
    async fn start_feature(
        &self,
        params: Parameters<FeatureIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json(&self.test_set_status(params.0.feature_id, FeatureStatus::InProgress)?)
    }

    #[tool(
        description = "Mark a feature 'passing' and log a 'completed' entry. Only call this once the feature is verified end to end."
    )]
    async fn pass_feature(
        &self,
        params: Parameters<FeatureIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json(&self.test_set_status(params.0.feature_id, FeatureStatus::Passing)?)
    }

    #[tool(
        description = "Mark a feature 'failing' because it needs more work, and log a note saying so."
    )]
    async fn fail_feature(
        &self,
        params: Parameters<FeatureIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json(&self.test_set_status(params.0.feature_id, FeatureStatus::Failing)?)
    }

    // ============================================================
    // Progress Tools
    // ============================================================

    #[tool(
        description = "Append an entry to the progress log. Use 'note' for observations, 'blocker' for anything stopping progress."
    )]
    async fn log_progress(
        &self,
        params: Parameters<LogProgressRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        Self::json(&self.test_log_progress(&req.entry_type, &req.message)?)
    }

    #[tool(description = "Read the most recent progress log entries, oldest first.")]
    async fn read_progress(
        &self,
        params: Parameters<ReadProgressRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json(&self.test_read_progress(params.0.limit)?)
    }

    #[tool(
        description = "Create a checkpoint: logs a 'checkpoint' entry, then stages and commits all changes with the given message."
    )]
    async fn checkpoint(
        &self,
        params: Parameters<CheckpointRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::json(&self.test_checkpoint(&params.0.message)?)
    }
}

#[tool_handler]
impl ServerHandler for HarnessMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "agent-harness".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"The agent harness keeps your work continuous across sessions.

STATE:
- Feature checklist: every feature is failing, in_progress, or passing.
- Progress log: append-only record of what was started, completed, noted, or blocked.

WORKFLOW:
1. get_status to see where the project stands.
2. next_feature (or list_features) to pick work. One feature at a time.
3. start_feature before editing code.
4. log_progress as you go; log blockers as soon as you hit them.
5. pass_feature only when the feature is verified; fail_feature if it regressed.
6. checkpoint to commit a known-good state with a descriptive message.

Leave the code merge-ready at the end of every session."#;

pub async fn run_stdio_server(project: Project, vcs: Arc<dyn VersionControl>) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = HarnessMcpServer::new(project, vcs);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
