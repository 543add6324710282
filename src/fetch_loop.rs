//! The page-by-page pull loop.
//!
//! ```text
//! AwaitingUrl -> Fetching -> Dispatching -> Advancing -> AwaitingUrl
//!                   |                           |
//!                   +-> Aborted                 +-> Done
//! ```
//!
//! Writes are best effort and not transactional. A sink failure is logged
//! and the page still counts: the other sinks run and the checkpoint
//! advances. After a crash or a sink failure the mirror, the sheet, and the
//! checkpoint may disagree.

use crate::checkpoint::CheckpointStore;
use crate::error::{MirrorError, Result};
use crate::models::{Envelope, Product};
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Something that can fetch one page by URL.
pub trait PageSource {
    fn fetch_page(&mut self, url: &str) -> Result<Envelope>;
}

/// A destination for each fetched page's products.
pub trait ProductSink {
    /// Short label used in log lines.
    fn name(&self) -> &str;

    fn append(&mut self, items: &[Product]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// State and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingUrl,
    Fetching,
    Dispatching,
    Advancing,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Network error, non-2xx status, or a body that is not JSON.
    Transport(String),
    /// JSON body without a usable `products` array.
    Malformed(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Transport(msg) => write!(f, "request failed: {msg}"),
            AbortReason::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The last page had no `next_page_url`.
    Done,
    Aborted(AbortReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Pages fetched and dispatched.
    pub pages: usize,
    /// Products seen across those pages.
    pub products: usize,
    /// The last URL requested, successful or not.
    pub last_url: String,
    pub outcome: RunOutcome,
}

// ---------------------------------------------------------------------------
// FetchLoop
// ---------------------------------------------------------------------------

/// Drives a [`PageSource`] into a list of [`ProductSink`]s, persisting the
/// next page URL after each page.
pub struct FetchLoop {
    source: Box<dyn PageSource>,
    sinks: Vec<Box<dyn ProductSink>>,
    checkpoint: CheckpointStore,
    start_url: Option<String>,
    page_delay: Duration,
    state: LoopState,
}

impl FetchLoop {
    pub fn new(source: Box<dyn PageSource>, checkpoint: CheckpointStore) -> Self {
        Self {
            source,
            sinks: Vec::new(),
            checkpoint,
            start_url: None,
            page_delay: Duration::ZERO,
            state: LoopState::AwaitingUrl,
        }
    }

    /// Sinks receive each page in the order they were added.
    pub fn with_sink(mut self, sink: Box<dyn ProductSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Start from `url` instead of the checkpoint.
    pub fn with_start_url(mut self, url: Option<String>) -> Self {
        self.start_url = url;
        self
    }

    /// Pause between pages.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Fetch pages until the catalog ends or a fetch fails.
    ///
    /// Never returns an error; a fatal fetch failure ends the run with
    /// [`RunOutcome::Aborted`] and writes no checkpoint for that attempt.
    pub fn run(&mut self) -> RunSummary {
        let mut url = match self.start_url.take() {
            Some(url) => url,
            None => self.checkpoint.read(),
        };
        self.state = LoopState::AwaitingUrl;
        info!(url = %url, "Starting fetch loop");

        let mut pages = 0;
        let mut products = 0;

        let outcome = loop {
            self.state = LoopState::Fetching;
            let envelope = match self.source.fetch_page(&url) {
                Ok(envelope) => envelope,
                Err(MirrorError::MalformedResponse(msg)) => {
                    error!(url = %url, reason = %msg, "Malformed API response");
                    self.state = LoopState::Aborted;
                    break RunOutcome::Aborted(AbortReason::Malformed(msg));
                }
                Err(e) => {
                    error!(url = %url, error = %e, "Request failed");
                    self.state = LoopState::Aborted;
                    break RunOutcome::Aborted(AbortReason::Transport(e.to_string()));
                }
            };
            pages += 1;
            products += envelope.products.len();

            self.state = LoopState::Dispatching;
            self.dispatch(&envelope.products);

            self.state = LoopState::Advancing;
            match envelope.next_page_url {
                Some(next) => {
                    self.checkpoint.write(&next);
                    url = next;
                    self.state = LoopState::AwaitingUrl;
                    if !self.page_delay.is_zero() {
                        debug!(
                            delay_ms = self.page_delay.as_millis() as u64,
                            "Waiting before next page"
                        );
                        thread::sleep(self.page_delay);
                    }
                }
                None => {
                    warn!(url = %url, "No next page");
                    self.state = LoopState::Done;
                    break RunOutcome::Done;
                }
            }
        };

        info!(pages, products, "Fetch loop finished");
        RunSummary {
            pages,
            products,
            last_url: url,
            outcome,
        }
    }

    fn dispatch(&mut self, items: &[Product]) {
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.append(items) {
                error!(sink = sink.name(), error = %e, "Failed to append page");
            }
        }
    }
}
