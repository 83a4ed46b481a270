//! Condensed, plain-text status digest of the checklist and progress log.

use crate::models::*;
use crate::store::{FeatureStore, ProgressLog};

/// Longest description shown in the next-priority list.
const DESCRIPTION_WIDTH: usize = 60;

/// Everything the digest reports, derived from the two stores.
///
/// A store that cannot be read is recorded as a problem line instead of
/// failing the whole summary: missing state is a valid thing to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub counts: StatusCounts,
    pub next: Option<Feature>,
    pub upcoming: Vec<Feature>,
    pub latest: Option<ProgressEntry>,
    pub feature_problem: Option<String>,
    pub progress_problem: Option<String>,
}

impl StatusSummary {
    pub fn from_parts(
        checklist: &Checklist,
        latest: Option<ProgressEntry>,
        upcoming_limit: usize,
    ) -> Self {
        Self {
            counts: checklist.counts(),
            next: checklist.next_priority().cloned(),
            upcoming: checklist
                .upcoming(upcoming_limit)
                .into_iter()
                .cloned()
                .collect(),
            latest,
            feature_problem: None,
            progress_problem: None,
        }
    }

    /// Counts, next priority and latest progress, one line each.
    ///
    /// ```text
    /// Features: 3 total | 1 passing | 1 in progress | 1 failing
    /// Next priority: #2 Search
    /// Last progress: [2026-10-18 09:15 UTC] completed: Login
    /// ```
    pub fn render(&self) -> String {
        let mut lines = Vec::new();

        if let Some(problem) = &self.feature_problem {
            lines.push(format!("Features: unavailable ({})", problem));
        } else if self.counts.total() == 0 {
            lines.push("Features: no features tracked yet".to_string());
        } else {
            lines.push(format!(
                "Features: {} total | {} passing | {} in progress | {} failing",
                self.counts.total(),
                self.counts.passing,
                self.counts.in_progress,
                self.counts.failing
            ));
            match &self.next {
                Some(feature) => {
                    lines.push(format!("Next priority: #{} {}", feature.id, feature.name))
                }
                None => lines.push("Next priority: none, all features passing".to_string()),
            }
        }

        if let Some(problem) = &self.progress_problem {
            lines.push(format!("Last progress: unavailable ({})", problem));
        } else {
            match &self.latest {
                Some(entry) => lines.push(format!(
                    "Last progress: [{}] {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M UTC"),
                    entry
                )),
                None => lines.push("Last progress: no progress logged yet".to_string()),
            }
        }

        lines.join("\n")
    }

    /// The unfinished features, with status markers and shortened
    /// descriptions. Empty if every feature passes.
    pub fn render_upcoming(&self) -> String {
        if self.upcoming.is_empty() {
            return String::new();
        }

        let mut output = String::from("Next priority items:\n");
        for feature in &self.upcoming {
            output.push_str(&format!(
                "  {} #{} {}",
                feature.status.label(),
                feature.id,
                feature.name
            ));
            if !feature.description.is_empty() {
                output.push_str(": ");
                output.push_str(&shorten(&feature.description, DESCRIPTION_WIDTH));
            }
            output.push('\n');
        }
        output
    }
}

fn shorten(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width).collect();
    format!("{}...", cut.trim_end())
}

/// Reads both stores on demand and digests them. Holds no state of its own.
#[derive(Debug, Clone)]
pub struct Summarizer {
    features: FeatureStore,
    progress: ProgressLog,
    upcoming_limit: usize,
}

impl Summarizer {
    pub fn new(features: FeatureStore, progress: ProgressLog) -> Self {
        Self {
            features,
            progress,
            upcoming_limit: 5,
        }
    }

    pub fn with_upcoming_limit(mut self, limit: usize) -> Self {
        self.upcoming_limit = limit;
        self
    }

    pub fn status(&self) -> StatusSummary {
        let (checklist, feature_problem) = match self.features.load() {
            Ok(checklist) => (checklist, None),
            Err(e) => {
                tracing::warn!("Summarizing without features: {}", e);
                (Checklist::default(), Some(e.to_string()))
            }
        };

        let (latest, progress_problem) = match self.progress.latest() {
            Ok(latest) => (latest, None),
            Err(e) => {
                tracing::warn!("Summarizing without progress: {}", e);
                (None, Some(e.to_string()))
            }
        };

        StatusSummary {
            feature_problem,
            progress_problem,
            ..StatusSummary::from_parts(&checklist, latest, self.upcoming_limit)
        }
    }

    /// The digest as text. Never fails.
    pub fn summarize(&self) -> String {
        self.status().render()
    }
}
