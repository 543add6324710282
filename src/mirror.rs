//! Local JSON mirror of every product fetched so far.
//!
//! The mirror is a single JSON array. Each append reads the whole file,
//! extends the array, and rewrites it, so the file is always a valid
//! document. Only one process may write it at a time.

use crate::error::Result;
use crate::fetch_loop::ProductSink;
use crate::models::Product;
use crate::persist;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Appends products to `products.json`.
pub struct LocalMirror {
    path: PathBuf,
}

impl LocalMirror {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current mirror contents. A missing file is an empty mirror.
    pub fn load(&self) -> Result<Vec<Value>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append `items` in order and rewrite the file.
    ///
    /// A corrupt existing file fails the append and is left as it was.
    /// Returns the number of products in the mirror afterwards.
    pub fn append(&self, items: &[Product]) -> Result<usize> {
        let mut all = self.load()?;
        all.extend(items.iter().cloned().map(Product::into_value));

        persist::replace_file(&self.path, &to_pretty_json(&all)?)?;
        info!(
            path = %self.path.display(),
            added = items.len(),
            total = all.len(),
            "Saved products to mirror"
        );
        Ok(all.len())
    }
}

/// Four-space indent, non-ASCII left as UTF-8.
fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

impl ProductSink for LocalMirror {
    fn name(&self) -> &str {
        "mirror"
    }

    fn append(&mut self, items: &[Product]) -> Result<()> {
        LocalMirror::append(self, items).map(|_| ())
    }
}
