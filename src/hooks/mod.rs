//! Session-boundary hooks invoked by the host agent runtime.
//!
//! Each hook reads a JSON object on stdin and answers with a JSON object on
//! stdout. The work itself is split in two: a pure function that turns store
//! state plus collaborator facts into text, and a thin runner that gathers
//! those facts from a [`Project`] and a [`VersionControl`].
//!
//! - [`session_start`]: injects recent commits, the progress log tail and the
//!   status digest when a session begins.
//! - [`stop`]: reminds the agent to log progress, commit, and update feature
//!   status when it stops.
//! - [`pre_tool_use`]: nudges (or, in strict mode, blocks) file edits made
//!   while no feature is in progress.

pub mod pre_tool_use;
pub mod session_start;
pub mod stop;

use serde::{Deserialize, Serialize};

use crate::project::Project;
use crate::vcs::VersionControl;

/// Which hook the host is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    SessionStart,
    Stop,
    PreToolUse,
}

/// The fields of the host's hook payload that the harness looks at.
/// Everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookInput {
    #[serde(rename = "stopReason", alias = "stop_reason")]
    pub stop_reason: Option<String>,
    pub tool_name: Option<String>,
    pub tool_input: serde_json::Value,
}

impl HookInput {
    /// Parse the payload. An empty or unreadable payload is treated as an
    /// empty one so a hook never fails on its input.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(raw) {
            Ok(input) => input,
            Err(e) => {
                tracing::debug!("Ignoring unparseable hook input: {}", e);
                Self::default()
            }
        }
    }
}

/// The hook's answer. Serializes to `{}` when there is nothing to say.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct HookOutput {
    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HookSpecificOutput {
    #[serde(rename = "permissionDecision")]
    pub permission_decision: String,
}

impl HookOutput {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            system_message: Some(text.into()),
            hook_specific_output: None,
        }
    }

    pub fn deny(text: impl Into<String>) -> Self {
        Self {
            system_message: Some(text.into()),
            hook_specific_output: Some(HookSpecificOutput {
                permission_decision: "deny".to_string(),
            }),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Run one hook against a project.
pub fn run(
    event: HookEvent,
    project: &Project,
    vcs: &dyn VersionControl,
    input: &HookInput,
) -> HookOutput {
    tracing::debug!("Running {:?} hook in {}", event, project.root().display());

    let output = match event {
        HookEvent::SessionStart => {
            session_start::session_start(project, vcs).map(HookOutput::message)
        }
        HookEvent::Stop => stop::stop(project, vcs, input).map(HookOutput::message),
        HookEvent::PreToolUse => Some(pre_tool_use::pre_tool_use(project, input)),
    };
    output.unwrap_or_default()
}
