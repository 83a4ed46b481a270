//! One-feature-at-a-time guard for file edits.

use crate::config::{EnforcementMode, HarnessConfig};
use crate::models::Checklist;
use crate::project::Project;

use super::{HookInput, HookOutput};

/// Tools whose use counts as changing the project.
const EDIT_TOOLS: &[&str] = &["Edit", "Write"];

/// How many unfinished features to suggest.
const SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusDecision {
    Allow,
    Warn(String),
    Deny(String),
}

/// Decide whether an edit fits the one-feature-at-a-time discipline.
///
/// Edits are fine when a feature is in progress, when no features are
/// defined, or when enforcement is relaxed or switched off.
pub fn check_feature_focus(
    tool_name: &str,
    checklist: &Checklist,
    config: &HarnessConfig,
) -> FocusDecision {
    if !config.feature_enforcement || config.mode == EnforcementMode::Relaxed {
        return FocusDecision::Allow;
    }
    if !EDIT_TOOLS.contains(&tool_name) {
        return FocusDecision::Allow;
    }
    if checklist.features.is_empty() || checklist.current().is_some() {
        return FocusDecision::Allow;
    }

    let upcoming = checklist.upcoming(SUGGESTIONS);
    let message = if upcoming.is_empty() {
        "[Harness] No feature currently in progress. \
         Use `harness feature start <id>` to begin working on a feature."
            .to_string()
    } else {
        let list = upcoming
            .iter()
            .map(|f| format!("  {}. {}", f.id, f.name))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "[Harness] No feature currently in progress.\n\
             Consider starting one before making changes:\n{}\n\
             Use `harness feature start <id>` to begin.",
            list
        )
    };

    match config.mode {
        EnforcementMode::Strict => FocusDecision::Deny(format!(
            "{}\n\n[Strict mode: Operation blocked until a feature is started]",
            message
        )),
        _ => FocusDecision::Warn(message),
    }
}

pub fn pre_tool_use(project: &Project, input: &HookInput) -> HookOutput {
    if !project.is_initialized() {
        return HookOutput::default();
    }
    let Some(tool_name) = input.tool_name.as_deref() else {
        return HookOutput::default();
    };

    let checklist = match project.features().load() {
        Ok(checklist) => checklist,
        Err(e) => {
            tracing::warn!("Skipping feature-focus check: {}", e);
            return HookOutput::default();
        }
    };

    match check_feature_focus(tool_name, &checklist, project.config()) {
        FocusDecision::Allow => HookOutput::default(),
        FocusDecision::Warn(message) => HookOutput::message(message),
        FocusDecision::Deny(message) => HookOutput::deny(message),
    }
}
