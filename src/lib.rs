//! Catalog mirror.
//!
//! Pulls a paginated product catalog page by page, appends every product to
//! a local JSON mirror and one row per product to a Google Sheet, and
//! records the next page URL so an interrupted run resumes where it stopped.
//!
//! # Quick start
//!
//! ```no_run
//! use catalog_mirror::CatalogMirror;
//!
//! let mirror = CatalogMirror::builder().build().unwrap();
//! let summary = mirror.run();
//! println!("fetched {} pages", summary.pages);
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod catalog;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod fetch_loop;
pub mod mirror;
pub mod models;
mod persist;
pub mod sheets;

#[cfg(feature = "async")]
pub use async_client::AsyncCatalogMirror;
pub use catalog::CatalogClient;
pub use checkpoint::CheckpointStore;
pub use config::{MirrorConfig, SheetsConfig};
pub use error::{MirrorError, Result};
pub use fetch_loop::{
    AbortReason, FetchLoop, LoopState, PageSource, ProductSink, RunOutcome, RunSummary,
};
pub use mirror::LocalMirror;
pub use models::{Envelope, Product};
pub use sheets::SheetsSink;

use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ---------------------------------------------------------------------------
// CatalogMirrorBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`CatalogMirror`].
///
/// Every field starts at the defaults in [`config`]. Use
/// [`CatalogMirror::builder()`] to obtain one.
pub struct CatalogMirrorBuilder {
    config: MirrorConfig,
    sheets: SheetsConfig,
    sheets_enabled: bool,
}

impl Default for CatalogMirrorBuilder {
    fn default() -> Self {
        let config = MirrorConfig::default();
        let sheets = config.sheets.clone().unwrap_or_default();
        Self {
            config,
            sheets,
            sheets_enabled: true,
        }
    }
}

impl CatalogMirrorBuilder {
    /// Root of the catalog, fetched when there is no checkpoint.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Start from this URL regardless of the checkpoint file.
    pub fn start_url(mut self, url: impl Into<String>) -> Self {
        self.config.start_url = Some(url.into());
        self
    }

    pub fn mirror_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.mirror_path = path.as_ref().to_path_buf();
        self
    }

    pub fn checkpoint_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.checkpoint_path = path.as_ref().to_path_buf();
        self
    }

    /// Per-request timeout for both the catalog and the Sheets API.
    ///
    /// Defaults to 10 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Pause between pages. Defaults to 10 seconds.
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.config.page_delay = delay;
        self
    }

    /// Enable or disable the spreadsheet sink. Enabled by default.
    pub fn sheets(mut self, enabled: bool) -> Self {
        self.sheets_enabled = enabled;
        self
    }

    pub fn credentials_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sheets.credentials_path = path.as_ref().to_path_buf();
        self
    }

    pub fn spreadsheet_id(mut self, id: impl Into<String>) -> Self {
        self.sheets.spreadsheet_id = id.into();
        self
    }

    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheets.sheet_name = name.into();
        self
    }

    /// Prefix for the product URL written to each row.
    pub fn row_base_url(mut self, url: impl Into<String>) -> Self {
        self.sheets.row_base_url = url.into();
        self
    }

    pub fn sheets_api_base(mut self, url: impl Into<String>) -> Self {
        self.sheets.api_base = url.into();
        self
    }

    pub fn token_uri(mut self, url: impl Into<String>) -> Self {
        self.sheets.token_uri = url.into();
        self
    }

    /// Validate the configuration and build the mirror.
    ///
    /// Nothing touches the network or the filesystem here; credentials are
    /// read on the first spreadsheet append.
    pub fn build(self) -> Result<CatalogMirror> {
        let mut config = self.config;

        check_url("api_url", &config.api_url)?;
        if let Some(start) = &config.start_url {
            check_url("start_url", start)?;
        }
        if config.timeout.is_zero() {
            return Err(MirrorError::InvalidArgument("timeout must be non-zero".into()));
        }

        config.sheets = if self.sheets_enabled {
            check_url("row_base_url", &self.sheets.row_base_url)?;
            check_url("sheets_api_base", &self.sheets.api_base)?;
            check_url("token_uri", &self.sheets.token_uri)?;
            if self.sheets.spreadsheet_id.is_empty() {
                return Err(MirrorError::InvalidArgument("spreadsheet_id must not be empty".into()));
            }
            Some(self.sheets)
        } else {
            None
        };

        Ok(CatalogMirror { config })
    }
}

fn check_url(field: &str, value: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| {
            MirrorError::InvalidArgument(format!("{field} '{value}' is not a valid URL: {e}"))
        })
}

// ---------------------------------------------------------------------------
// CatalogMirror
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Holds an immutable [`MirrorConfig`] and wires a fresh [`FetchLoop`] for
/// each [`run`](CatalogMirror::run).
pub struct CatalogMirror {
    config: MirrorConfig,
}

impl CatalogMirror {
    /// Create a new builder with the default configuration.
    pub fn builder() -> CatalogMirrorBuilder {
        CatalogMirrorBuilder::default()
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn checkpoint(&self) -> CheckpointStore {
        CheckpointStore::new(&self.config.checkpoint_path, self.config.api_url.clone())
    }

    pub fn mirror(&self) -> LocalMirror {
        LocalMirror::new(&self.config.mirror_path)
    }

    /// Assemble the loop: catalog client, then mirror, then (if enabled)
    /// the spreadsheet sink.
    pub fn fetch_loop(&self) -> FetchLoop {
        let mut fetch_loop = FetchLoop::new(
            Box::new(CatalogClient::new(self.config.timeout)),
            self.checkpoint(),
        )
        .with_sink(Box::new(self.mirror()))
        .with_start_url(self.config.start_url.clone())
        .with_page_delay(self.config.page_delay);

        if let Some(sheets) = &self.config.sheets {
            let sink = SheetsSink::new(sheets.clone(), self.config.timeout);
            fetch_loop = fetch_loop.with_sink(Box::new(sink));
        }
        fetch_loop
    }

    /// Run one mirroring pass to completion. See [`FetchLoop::run`].
    pub fn run(&self) -> RunSummary {
        self.fetch_loop().run()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for CatalogMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sheet = match &self.config.sheets {
            Some(s) => format!("{}/{}", s.spreadsheet_id, s.sheet_name),
            None => "disabled".to_string(),
        };
        write!(
            f,
            "CatalogMirror(api_url={}, mirror={}, checkpoint={}, sheet={})",
            self.config.api_url,
            self.config.mirror_path.display(),
            self.config.checkpoint_path.display(),
            sheet
        )
    }
}
