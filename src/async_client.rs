//! Async wrapper around [`CatalogMirror`] for use inside Tokio programs.
//!
//! The run is blocking I/O from start to finish, so it is moved onto the
//! blocking thread pool via [`tokio::task::spawn_blocking`]. Runs are
//! serialized through a mutex: two concurrent runs would race on the
//! checkpoint and mirror files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_mirror::{AsyncCatalogMirror, CatalogMirror};
//!
//! # async fn example() -> catalog_mirror::Result<()> {
//! let mirror = AsyncCatalogMirror::new(CatalogMirror::builder().build()?);
//! let summary = mirror.run().await?;
//! println!("{} products", summary.products);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex};

use crate::error::{MirrorError, Result};
use crate::fetch_loop::RunSummary;
use crate::CatalogMirror;

pub struct AsyncCatalogMirror {
    inner: Arc<Mutex<CatalogMirror>>,
}

impl AsyncCatalogMirror {
    pub fn new(mirror: CatalogMirror) -> Self {
        Self {
            inner: Arc::new(Mutex::new(mirror)),
        }
    }

    /// Run one mirroring pass on the blocking thread pool.
    ///
    /// A second call made while a run is in progress waits for it to
    /// finish.
    pub async fn run(&self) -> Result<RunSummary> {
        let mirror = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = mirror
                .lock()
                .map_err(|_| MirrorError::InvalidArgument("Mirror lock poisoned".into()))?;
            Ok(guard.run())
        })
        .await
        .map_err(|e| MirrorError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

impl Clone for AsyncCatalogMirror {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
