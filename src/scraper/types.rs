//! Scraper types for Gator.

use crate::error::FetchError;

/// Channel data parsed from an RSS document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    /// Channel title.
    pub title: String,
    /// Channel link.
    pub link: String,
    /// Channel description.
    pub description: String,
    /// Items in document order.
    pub items: Vec<ParsedItem>,
}

/// Item data parsed from an RSS document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedItem {
    /// Item title.
    pub title: String,
    /// Item link.
    pub link: String,
    /// Item description, as found in the feed.
    pub description: String,
    /// Raw `pubDate` text, if present.
    pub pub_date: Option<String>,
}

/// Counters for one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Posts newly stored.
    pub inserted: usize,
    /// Items whose URL was already stored.
    pub duplicates: usize,
    /// Items dropped because they have no link.
    pub skipped: usize,
    /// Stored posts whose publication date could not be parsed.
    pub undated: usize,
}

/// Result of a single scrape cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// There are no feeds to scrape.
    Idle,
    /// The selected feed could not be fetched; it stays eligible for later cycles.
    FetchFailed {
        /// Selected feed.
        feed_id: i64,
        /// Why the fetch failed.
        error: FetchError,
    },
    /// Cancellation arrived mid-cycle; the report covers what was written before.
    Cancelled {
        /// Selected feed.
        feed_id: i64,
        /// Posts handled before cancellation.
        report: IngestReport,
    },
    /// The feed was fetched and its items ingested.
    Ingested {
        /// Selected feed.
        feed_id: i64,
        /// Ingestion counters.
        report: IngestReport,
    },
}

impl CycleOutcome {
    /// The feed selected in this cycle, if any.
    pub fn feed_id(&self) -> Option<i64> {
        match self {
            CycleOutcome::Idle => None,
            CycleOutcome::FetchFailed { feed_id, .. }
            | CycleOutcome::Cancelled { feed_id, .. }
            | CycleOutcome::Ingested { feed_id, .. } => Some(*feed_id),
        }
    }
}
