//! Version-control capability used at session boundaries and for checkpoints.
//!
//! The harness only needs three things from version control, captured by
//! [`VersionControl`]. [`Git`] implements them by running the `git` binary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {stderr}")]
    Failed { command: String, stderr: String },
}

/// One line of commit history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub hash: String,
    pub subject: String,
}

impl fmt::Display for CommitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.hash, self.subject)
    }
}

/// What a commit request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { hash: String },
    NothingToCommit,
}

pub trait VersionControl: Send + Sync {
    /// The most recent `n` commits, newest first.
    fn recent_commits(&self, n: usize) -> Result<Vec<CommitSummary>, VcsError>;

    fn has_uncommitted_changes(&self) -> Result<bool, VcsError>;

    /// Stage everything and commit it with `message`.
    fn commit(&self, message: &str) -> Result<CommitOutcome, VcsError>;
}

/// [`VersionControl`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct Git {
    work_dir: PathBuf,
}

impl Git {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn run(&self, args: &[&str]) -> Result<Output, VcsError> {
        Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|source| VcsError::Spawn {
                command: describe(args),
                source,
            })
    }

    fn run_checked(&self, args: &[&str]) -> Result<String, VcsError> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(VcsError::Failed {
                command: describe(args),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

fn describe(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

impl VersionControl for Git {
    fn recent_commits(&self, n: usize) -> Result<Vec<CommitSummary>, VcsError> {
        let count = format!("-{}", n);
        let stdout = self.run_checked(&["log", &count, "--oneline", "--no-decorate"])?;
        Ok(parse_oneline_log(&stdout))
    }

    fn has_uncommitted_changes(&self) -> Result<bool, VcsError> {
        let stdout = self.run_checked(&["status", "--porcelain"])?;
        Ok(!stdout.trim().is_empty())
    }

    fn commit(&self, message: &str) -> Result<CommitOutcome, VcsError> {
        self.run_checked(&["add", "-A"])?;

        let output = self.run(&["commit", "-m", message])?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            // "nothing to commit" is not a real error
            if stdout.contains("nothing to commit") || stderr.contains("nothing to commit") {
                return Ok(CommitOutcome::NothingToCommit);
            }
            return Err(VcsError::Failed {
                command: "git commit".to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let hash = self
            .run_checked(&["rev-parse", "--short", "HEAD"])?
            .trim()
            .to_string();
        tracing::info!("Created commit {}", hash);
        Ok(CommitOutcome::Committed { hash })
    }
}

/// Parse `git log --oneline` output into commit summaries.
fn parse_oneline_log(stdout: &str) -> Vec<CommitSummary> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| match line.split_once(' ') {
            Some((hash, subject)) => CommitSummary {
                hash: hash.to_string(),
                subject: subject.to_string(),
            },
            None => CommitSummary {
                hash: line.to_string(),
                subject: String::new(),
            },
        })
        .collect()
}
