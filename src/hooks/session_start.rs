//! Context injected into the agent's window when a session begins.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::ProgressEntry;
use crate::project::Project;
use crate::summary::StatusSummary;
use crate::vcs::{CommitSummary, VersionControl};

/// Result of running the project's startup script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    Succeeded { script: String },
    Failed { script: String, reason: String },
}

/// Everything that goes into the session-start block.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub started_at: DateTime<Utc>,
    pub work_dir: PathBuf,
    pub startup: Option<StartupOutcome>,
    /// Recent commits, or why they could not be read.
    pub commits: Result<Vec<CommitSummary>, String>,
    pub uncommitted_changes: Option<bool>,
    pub progress: Result<Vec<ProgressEntry>, String>,
    /// Entries older than the tail that were left out.
    pub progress_omitted: usize,
    pub status: StatusSummary,
}

impl SessionContext {
    /// Render the block: commits, then progress tail, then the status digest.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push("=== AGENT HARNESS SESSION STARTUP ===".to_string());
        lines.push(format!(
            "Session started: {}",
            self.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        lines.push(format!("Working directory: {}", self.work_dir.display()));
        match &self.startup {
            Some(StartupOutcome::Succeeded { script }) => {
                lines.push(format!("Startup script: {} ran successfully", script))
            }
            Some(StartupOutcome::Failed { script, reason }) => {
                lines.push(format!("Startup script: {} failed ({})", script, reason))
            }
            None => {}
        }
        lines.push(String::new());

        lines.push("--- RECENT COMMITS ---".to_string());
        match &self.commits {
            Ok(commits) if commits.is_empty() => lines.push("(no commits)".to_string()),
            Ok(commits) => lines.extend(commits.iter().map(ToString::to_string)),
            Err(reason) => lines.push(format!(
                "(version control history unavailable: {})",
                reason
            )),
        }
        match self.uncommitted_changes {
            Some(true) => lines.push("Working tree: uncommitted changes present".to_string()),
            Some(false) => lines.push("Working tree: clean".to_string()),
            None => {}
        }
        lines.push(String::new());

        lines.push("--- PROGRESS LOG ---".to_string());
        match &self.progress {
            Ok(entries) if entries.is_empty() => {
                lines.push("(no progress logged yet)".to_string())
            }
            Ok(entries) => {
                if self.progress_omitted > 0 {
                    lines.push(format!(
                        "[...{} earlier entries omitted...]",
                        self.progress_omitted
                    ));
                }
                lines.extend(entries.iter().map(ProgressEntry::to_line));
            }
            Err(reason) => lines.push(format!("(progress log unavailable: {})", reason)),
        }
        lines.push(String::new());

        lines.push("--- FEATURE STATUS ---".to_string());
        lines.push(self.status.render());
        let upcoming = self.status.render_upcoming();
        if !upcoming.is_empty() {
            lines.push(String::new());
            lines.push(upcoming.trim_end().to_string());
        }
        lines.push(String::new());

        lines.push("=== END SESSION CONTEXT ===".to_string());
        lines.push(String::new());
        lines.push(
            "IMPORTANT: Review the above context before starting work. \
             Select the highest-priority incomplete feature and update the progress log as you work."
                .to_string(),
        );

        lines.join("\n")
    }
}

/// Run the startup script if the project has one. Output is discarded;
/// only its side effects matter.
pub fn run_startup_script(root: &Path, script: &str) -> Option<StartupOutcome> {
    let path = root.join(script);
    if !path.is_file() {
        return None;
    }

    tracing::info!("Running startup script {}", path.display());
    let status = Command::new(&path)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    let outcome = match status {
        Ok(status) if status.success() => StartupOutcome::Succeeded {
            script: script.to_string(),
        },
        Ok(status) => StartupOutcome::Failed {
            script: script.to_string(),
            reason: status.to_string(),
        },
        Err(e) => StartupOutcome::Failed {
            script: script.to_string(),
            reason: e.to_string(),
        },
    };
    if let StartupOutcome::Failed { reason, .. } = &outcome {
        tracing::warn!("Startup script {} failed: {}", path.display(), reason);
    }
    Some(outcome)
}

/// Build the session-start block, or `None` if the project has not opted in.
pub fn session_start(project: &Project, vcs: &dyn VersionControl) -> Option<String> {
    if !project.is_initialized() {
        tracing::debug!(
            "No init marker in {}, skipping session context",
            project.root().display()
        );
        return None;
    }

    let config = project.config();
    let startup = run_startup_script(project.root(), &config.startup_script);

    let commits = vcs
        .recent_commits(config.commit_history)
        .map_err(|e| e.to_string());
    let uncommitted_changes = match &commits {
        Ok(_) => vcs.has_uncommitted_changes().ok(),
        Err(_) => None,
    };

    let (progress, progress_omitted) = match project.progress().all() {
        Ok(mut entries) => {
            let omitted = entries.len().saturating_sub(config.progress_tail);
            (Ok(entries.split_off(omitted)), omitted)
        }
        Err(e) => (Err(e.to_string()), 0),
    };

    let context = SessionContext {
        started_at: Utc::now(),
        work_dir: project.root().to_path_buf(),
        startup,
        commits,
        uncommitted_changes,
        progress,
        progress_omitted,
        status: project.summarizer().status(),
    };
    Some(context.render())
}
