use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// One line of the progress log.
///
/// Entries are written once and never edited, so the log reads like a
/// `git log` of the agent's sessions: what was started, finished, noted or
/// blocked, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub timestamp: DateTime<Utc>,
    pub entry_type: EntryType,
    pub message: String,
}

/// What kind of event a progress entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Started,
    Completed,
    Checkpoint,
    Note,
    Blocker,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Checkpoint => "checkpoint",
            Self::Note => "note",
            Self::Blocker => "blocker",
        }
    }

    /// The upper-case marker used in the log file.
    fn marker(&self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Completed => "COMPLETED",
            Self::Checkpoint => "CHECKPOINT",
            Self::Note => "NOTE",
            Self::Blocker => "BLOCKER",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    /// Accepts both the lower-case name and the file marker.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "started" => Ok(Self::Started),
            "completed" => Ok(Self::Completed),
            "checkpoint" => Ok(Self::Checkpoint),
            "note" => Ok(Self::Note),
            "blocker" => Ok(Self::Blocker),
            _ => Err(format!(
                "Invalid entry type '{}'. Must be: started, completed, checkpoint, note, or blocker",
                s
            )),
        }
    }
}

impl ProgressEntry {
    /// The timestamp is truncated to whole seconds, the precision of the
    /// log line, so an entry equals what is later read back.
    pub fn new(entry_type: EntryType, message: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(0),
            entry_type,
            message: fold_lines(message),
        }
    }

    /// Render the entry as a single self-describing log line (no newline).
    ///
    /// ```text
    /// [2026-10-18T09:15:00Z] COMPLETED: Login
    /// ```
    pub fn to_line(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.entry_type.marker(),
            self.message
        )
    }

    /// Parse a line written by [`ProgressEntry::to_line`].
    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('[')?;
        let (stamp, rest) = rest.split_once("] ")?;
        let timestamp = DateTime::parse_from_rfc3339(stamp)
            .ok()?
            .with_timezone(&Utc);
        let (marker, message) = match rest.split_once(": ") {
            Some((marker, message)) => (marker, message),
            None => (rest.strip_suffix(':')?, ""),
        };
        let entry_type = marker.parse().ok()?;
        Some(Self {
            timestamp,
            entry_type,
            message: message.to_string(),
        })
    }
}

impl fmt::Display for ProgressEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry_type, self.message)
    }
}

/// One entry is one line, so embedded line breaks become spaces.
fn fold_lines(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
