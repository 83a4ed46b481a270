//! Persistence for the feature checklist and the progress log.
//!
//! Both stores sit on top of a [`Storage`] handle rather than a hard-coded
//! path, so callers decide where state lives and tests can swap in
//! [`MemoryStorage`].
//!
//! There is no locking. Two sessions writing the same project at once can
//! lose an update; the last writer wins.

mod features;
mod progress;

pub use features::FeatureStore;
pub use progress::ProgressLog;

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A single persisted text document.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Human-readable location, used in error messages.
    fn location(&self) -> String;

    /// Read the whole document. `Ok(None)` if it does not exist yet.
    fn load(&self) -> io::Result<Option<String>>;

    /// Replace the whole document. Either the new contents land in full or
    /// the previous document is left as it was.
    fn replace(&self, contents: &str) -> io::Result<()>;

    /// Append one line, creating the document if needed. A document that
    /// does not end in a newline gets one first, so the new line always
    /// starts on a line of its own.
    fn append_line(&self, line: &str) -> io::Result<()>;
}

/// A document on the local file system.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

impl Storage for FileStorage {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn replace(&self, contents: &str) -> io::Result<()> {
        self.ensure_parent()?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)
    }

    fn append_line(&self, line: &str) -> io::Result<()> {
        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        if ends_mid_line(&mut file)? {
            writeln!(file)?;
        }
        writeln!(file, "{}", line)
    }
}

/// Whether the file is non-empty and its last byte is not a newline.
fn ends_mid_line(file: &mut File) -> io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// An in-memory document. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing contents, as if read from disk.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    pub fn snapshot(&self) -> Option<String> {
        self.contents.lock().expect("storage lock poisoned").clone()
    }
}

impl Storage for MemoryStorage {
    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.snapshot())
    }

    fn replace(&self, contents: &str) -> io::Result<()> {
        *self.contents.lock().expect("storage lock poisoned") = Some(contents.to_string());
        Ok(())
    }

    fn append_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self.contents.lock().expect("storage lock poisoned");
        let buf = guard.get_or_insert_with(String::new);
        if !buf.is_empty() && !buf.ends_with('\n') {
            buf.push('\n');
        }
        buf.push_str(line);
        buf.push('\n');
        Ok(())
    }
}
