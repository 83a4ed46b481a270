//! Advisory reminder shown when the agent stops. Never changes any state.

use crate::models::*;
use crate::project::{Project, PROGRESS_FILE};
use crate::vcs::VersionControl;

use super::HookInput;

/// Stop reasons that mean the agent finished normally. Anything else
/// (errors, interrupts) gets no reminder.
const NORMAL_STOPS: &[&str] = &["end_turn", "stop_sequence"];

/// Whether the host's stop reason warrants a reminder. A host that does not
/// report a reason is treated as a normal stop.
pub fn should_remind(stop_reason: Option<&str>) -> bool {
    match stop_reason {
        None => true,
        Some(reason) => NORMAL_STOPS.contains(&reason),
    }
}

/// In-progress features with no `completed` entry among `recent` that
/// mentions them by name.
pub fn unfinished_features<'a>(
    features: &'a [Feature],
    recent: &[ProgressEntry],
) -> Vec<&'a Feature> {
    features
        .iter()
        .filter(|f| f.status == FeatureStatus::InProgress)
        .filter(|f| {
            !recent.iter().any(|entry| {
                entry.entry_type == EntryType::Completed && mentions(&entry.message, &f.name)
            })
        })
        .collect()
}

/// Case-insensitive match of `name` as a whole word or phrase in `message`,
/// so "Log" is not found in "Login".
fn mentions(message: &str, name: &str) -> bool {
    let message = message.to_lowercase();
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return false;
    }

    message.match_indices(&name).any(|(start, _)| {
        let before = message[..start].chars().next_back();
        let after = message[start + name.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Build the reminder text.
pub fn stop_reminder(
    features: &[Feature],
    recent: &[ProgressEntry],
    has_uncommitted_changes: bool,
) -> String {
    let mut lines = vec![
        "[Agent Harness Checkpoint Reminder]".to_string(),
        format!(
            "- Update {} with what was accomplished this session",
            PROGRESS_FILE
        ),
    ];

    if has_uncommitted_changes {
        lines.push("- Commit your changes as a checkpoint with a descriptive message".to_string());
        lines.push("- Ensure code is left in a merge-ready state".to_string());
    }

    for feature in unfinished_features(features, recent) {
        lines.push(format!(
            "- Feature #{} \"{}\" is still in progress: mark it passing once verified, or failing if it needs more work",
            feature.id, feature.name
        ));
    }

    lines.join("\n")
}

/// Gather state and build the reminder, or `None` when no reminder applies.
pub fn stop(project: &Project, vcs: &dyn VersionControl, input: &HookInput) -> Option<String> {
    if !project.is_initialized() {
        return None;
    }
    if !should_remind(input.stop_reason.as_deref()) {
        tracing::debug!("No reminder for stop reason {:?}", input.stop_reason);
        return None;
    }

    let features = project.features().list().unwrap_or_else(|e| {
        tracing::warn!("Reminding without features: {}", e);
        Vec::new()
    });
    let recent = project
        .progress()
        .tail(project.config().reminder_window)
        .unwrap_or_else(|e| {
            tracing::warn!("Reminding without progress: {}", e);
            Vec::new()
        });
    let dirty = vcs.has_uncommitted_changes().unwrap_or_else(|e| {
        tracing::debug!("Could not check working tree: {}", e);
        false
    });

    Some(stop_reminder(&features, &recent, dirty))
}
