use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use super::{FileStorage, MemoryStorage, Storage};
use crate::error::{Error, Result};
use crate::models::*;

/// Header written when the log is first created. Lines starting with `#`
/// are ignored when reading.
const HEADER: &str = "# Agent progress log. One entry per line: [timestamp] TYPE: message";

/// The append-only progress log.
///
/// The file is plain text so it stays readable without any tooling. Lines
/// that are not entries (comments, hand-written notes) are skipped when
/// reading.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    storage: Arc<dyn Storage>,
}

impl ProgressLog {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(path)))
    }

    pub fn open_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn location(&self) -> String {
        self.storage.location()
    }

    fn io_err(&self, source: std::io::Error) -> Error {
        Error::Io {
            location: self.location(),
            source,
        }
    }

    /// Write the comment header if the log does not exist yet. Returns
    /// whether the log was created.
    pub fn ensure_exists(&self) -> Result<bool> {
        if self.storage.load().map_err(|e| self.io_err(e))?.is_some() {
            return Ok(false);
        }
        self.storage
            .append_line(HEADER)
            .map_err(|e| self.io_err(e))?;
        Ok(true)
    }

    /// Stamp and append one entry.
    pub fn append(&self, entry_type: EntryType, message: &str) -> Result<ProgressEntry> {
        let entry = ProgressEntry::new(entry_type, message, Utc::now());
        self.storage
            .append_line(&entry.to_line())
            .map_err(|e| self.io_err(e))?;

        tracing::info!("Logged {}", entry);
        Ok(entry)
    }

    /// The whole history, oldest first.
    pub fn all(&self) -> Result<Vec<ProgressEntry>> {
        let Some(contents) = self.storage.load().map_err(|e| self.io_err(e))? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match ProgressEntry::parse_line(line) {
                Some(entry) => entries.push(entry),
                None => tracing::warn!(
                    "Skipping unrecognized line {} in {}",
                    number + 1,
                    self.location()
                ),
            }
        }
        Ok(entries)
    }

    /// The last `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Result<Vec<ProgressEntry>> {
        let mut entries = self.all()?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries.split_off(skip))
    }

    pub fn latest(&self) -> Result<Option<ProgressEntry>> {
        Ok(self.all()?.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_skips_comments_and_free_text() {
        let storage = MemoryStorage::with_contents(
            "# header\n\nremember to rotate keys\n[2026-10-18T09:15:00Z] NOTE: kept\n",
        );
        let log = ProgressLog::new(Arc::new(storage));

        let entries = log.all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }

    #[test]
    fn test_append_after_hand_edit_without_newline_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claude-progress.txt");
        std::fs::write(&path, "# header\nremember to rotate keys").unwrap();
        let log = ProgressLog::open(&path);

        let appended = log.append(EntryType::Note, "kept").unwrap();

        assert_eq!(log.all().unwrap(), vec![appended.clone()]);
        assert_eq!(log.tail(1).unwrap(), vec![appended]);
    }

    #[test]
    fn test_ensure_exists_writes_header_once() {
        let storage = MemoryStorage::new();
        let log = ProgressLog::new(Arc::new(storage.clone()));

        assert!(log.ensure_exists().unwrap());
        assert!(!log.ensure_exists().unwrap());
        assert_eq!(storage.snapshot().unwrap().lines().count(), 1);
        assert!(log.all().unwrap().is_empty());
    }

    #[test]
    fn test_tail_zero_is_empty() {
        let log = ProgressLog::open_memory();
        log.append(EntryType::Note, "one").unwrap();
        assert!(log.tail(0).unwrap().is_empty());
    }
}
