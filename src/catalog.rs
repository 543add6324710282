//! Blocking HTTP client for the paginated catalog API.

use crate::error::{MirrorError, Result};
use crate::fetch_loop::PageSource;
use crate::models::Envelope;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};

pub(crate) const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Fetches one catalog page per call.
///
/// The underlying HTTP client is created on first use and reused for every
/// later page.
pub struct CatalogClient {
    timeout: Duration,
    client: Option<Client>,
}

impl CatalogClient {
    /// `timeout` bounds each request end to end.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: None,
        }
    }

    fn client(&mut self) -> Result<&Client> {
        let client = match self.client.take() {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout)
                .user_agent(USER_AGENT)
                .build()?,
        };
        Ok(&*self.client.insert(client))
    }

    /// GET `url` and parse the page envelope.
    ///
    /// Transport errors, non-2xx statuses, and non-JSON bodies come back as
    /// [`MirrorError::Http`] or [`MirrorError::Status`]. A JSON body without
    /// `products` is [`MirrorError::MalformedResponse`].
    pub fn fetch_page(&mut self, url: &str) -> Result<Envelope> {
        info!(url, "Requesting catalog page");
        let resp = self.client()?.get(url).send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MirrorError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body: serde_json::Value = resp.json()?;
        let envelope = Envelope::from_value(body)?;
        debug!(
            url,
            count = envelope.products.len(),
            next = envelope.next_page_url.as_deref().unwrap_or(""),
            "Parsed catalog page"
        );
        Ok(envelope)
    }
}

impl PageSource for CatalogClient {
    fn fetch_page(&mut self, url: &str) -> Result<Envelope> {
        CatalogClient::fetch_page(self, url)
    }
}
