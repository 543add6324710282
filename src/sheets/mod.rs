//! Spreadsheet sink: one row per product, holding the product page URL.

mod client;
pub mod credentials;

pub use client::SheetsClient;
pub use credentials::{AccessToken, Credentials};

use crate::config::SheetsConfig;
use crate::error::{MirrorError, Result};
use crate::fetch_loop::ProductSink;
use crate::models::Product;
use std::time::Duration;
use tracing::debug;

/// Derive the sheet row for a product: `[base_url + slug]`.
pub fn product_row(product: &Product, base_url: &str) -> Result<Vec<String>> {
    let slug = product
        .slug()
        .ok_or_else(|| MirrorError::Sink("Product has no string `slug`".into()))?;
    Ok(vec![format!("{base_url}{slug}")])
}

/// Appends a derived row per product to the configured sheet.
pub struct SheetsSink {
    client: SheetsClient,
}

impl SheetsSink {
    pub fn new(config: SheetsConfig, timeout: Duration) -> Self {
        Self {
            client: SheetsClient::new(config, timeout),
        }
    }

    /// Rows for a whole page. One product without a slug fails the page.
    pub fn rows(&self, items: &[Product]) -> Result<Vec<Vec<String>>> {
        let base = &self.client.config().row_base_url;
        items.iter().map(|p| product_row(p, base)).collect()
    }

    pub fn append(&mut self, items: &[Product]) -> Result<()> {
        if items.is_empty() {
            debug!("Empty page, nothing to append to spreadsheet");
            return Ok(());
        }
        let rows = self.rows(items)?;
        self.client.append_rows(&rows)
    }
}

impl ProductSink for SheetsSink {
    fn name(&self) -> &str {
        "spreadsheet"
    }

    fn append(&mut self, items: &[Product]) -> Result<()> {
        SheetsSink::append(self, items)
    }
}
