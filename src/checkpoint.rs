//! Resume point persisted between runs.
//!
//! The checkpoint is a plain text file holding the URL of the next page to
//! fetch. It is read once at startup and overwritten after every page that
//! links to a successor.

use crate::error::Result;
use crate::persist;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Reads and writes the `last_url.txt` checkpoint.
pub struct CheckpointStore {
    path: PathBuf,
    root_url: String,
}

impl CheckpointStore {
    /// `root_url` is returned by [`read`](Self::read) whenever there is no
    /// usable checkpoint.
    pub fn new<P: AsRef<Path>>(path: P, root_url: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            root_url: root_url.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The URL to start from: the trimmed file contents, or the root URL if
    /// the file is missing, blank, or unreadable.
    pub fn read(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let url = contents.trim();
                if url.is_empty() {
                    self.root_url.clone()
                } else {
                    url.to_string()
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => self.root_url.clone(),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Unreadable checkpoint, starting from root"
                );
                self.root_url.clone()
            }
        }
    }

    /// Overwrite the checkpoint with exactly `url`.
    pub fn try_write(&self, url: &str) -> Result<()> {
        persist::replace_file(&self.path, url.as_bytes())?;
        Ok(())
    }

    /// Like [`try_write`](Self::try_write), but failures are logged and
    /// swallowed. The next cold start then resumes from whatever was last
    /// written successfully.
    pub fn write(&self, url: &str) {
        match self.try_write(url) {
            Ok(()) => info!(url, path = %self.path.display(), "Checkpoint updated"),
            Err(e) => {
                error!(url, path = %self.path.display(), error = %e, "Failed to write checkpoint")
            }
        }
    }
}
