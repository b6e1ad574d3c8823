//! Feed scrape scheduler for Gator.
//!
//! Runs one scrape cycle per tick: pick the stalest feed, stamp it, fetch it
//! and store its items as posts.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ScraperConfig;
use crate::db::Database;
use crate::feed::{Feed, FeedRepository};
use crate::post::{NewPost, PostRepository};
use crate::scraper::date::parse_pub_date;
use crate::scraper::fetcher::FeedSource;
use crate::scraper::types::{CycleOutcome, IngestReport, ParsedFeed, ParsedItem};
use crate::{GatorError, Result};

/// Default number of items ingested from one fetch.
pub const DEFAULT_MAX_ITEMS_PER_CYCLE: usize = 100;

/// Title stored for items that have none.
const UNTITLED: &str = "Untitled";

/// Parse a scrape interval such as `1m`, `30s` or `1h30m`.
pub fn parse_interval(s: &str) -> Result<Duration> {
    let duration = humantime::parse_duration(s.trim())
        .map_err(|e| GatorError::Validation(format!("invalid interval {:?}: {}", s, e)))?;

    if duration.is_zero() {
        return Err(GatorError::Validation(
            "interval must be greater than zero".to_string(),
        ));
    }

    Ok(duration)
}

/// Feed scrape scheduler.
pub struct Scraper<S> {
    db: Arc<Database>,
    source: S,
    interval: Duration,
    max_items: usize,
}

impl<S: FeedSource> Scraper<S> {
    /// Create a scraper with the given interval.
    pub fn new(db: Arc<Database>, source: S, interval: Duration) -> Self {
        Self {
            db,
            source,
            interval,
            max_items: DEFAULT_MAX_ITEMS_PER_CYCLE,
        }
    }

    /// Create a scraper using the interval and item limit from config.
    pub fn from_config(db: Arc<Database>, source: S, config: &ScraperConfig) -> Result<Self> {
        let interval = parse_interval(&config.interval)?;
        Ok(Self::new(db, source, interval).with_max_items(config.max_items_per_cycle))
    }

    /// Limit the number of items ingested from one fetch.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Time between cycles.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// The first cycle starts immediately. A slow cycle delays the next tick
    /// instead of causing a burst of catch-up cycles.
    ///
    /// Shutdown does not wait for the current cycle to finish. An in-flight
    /// fetch is abandoned and ingestion stops before the next post insert.
    /// Posts already inserted stay, and the feed keeps its new
    /// `last_fetched_at`.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            "Scraper started (interval: {})",
            humantime::format_duration(self.interval)
        );

        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            match self.scrape_once(&shutdown).await {
                Ok(CycleOutcome::Idle) => debug!("No feeds to scrape"),
                Ok(CycleOutcome::Cancelled { feed_id, report }) => {
                    info!(
                        "Scrape of feed {} cancelled after {} new post(s)",
                        feed_id, report.inserted
                    );
                }
                Ok(outcome) => debug!(?outcome, "Scrape cycle finished"),
                Err(e) => error!("Scrape cycle failed: {}", e),
            }
        }

        info!("Scraper stopped");
    }

    /// Run a single scrape cycle.
    pub async fn scrape_once(&self, cancel: &CancellationToken) -> Result<CycleOutcome> {
        let feeds = FeedRepository::new(self.db.pool());

        let Some(feed) = feeds.next_to_fetch().await? else {
            return Ok(CycleOutcome::Idle);
        };

        feeds.mark_fetched(feed.id, Utc::now()).await?;
        info!("Fetching feed {} ({}): {}", feed.id, feed.name, feed.url);

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(CycleOutcome::Cancelled {
                    feed_id: feed.id,
                    report: IngestReport::default(),
                });
            }
            result = self.source.fetch(&feed.url) => result,
        };

        match fetched {
            Ok(parsed) => self.ingest(&feed, parsed, cancel).await,
            Err(e) => {
                warn!("Failed to fetch feed {}: {}", feed.id, e);
                Ok(CycleOutcome::FetchFailed {
                    feed_id: feed.id,
                    error: e,
                })
            }
        }
    }

    /// Store the items of a fetched feed.
    async fn ingest(
        &self,
        feed: &Feed,
        parsed: ParsedFeed,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome> {
        let posts = PostRepository::new(self.db.pool());
        let mut report = IngestReport::default();

        debug!(
            "Feed {} returned {} item(s) (channel: {:?})",
            feed.id,
            parsed.items.len(),
            parsed.title
        );

        for item in parsed.items.into_iter().take(self.max_items) {
            if cancel.is_cancelled() {
                return Ok(CycleOutcome::Cancelled {
                    feed_id: feed.id,
                    report,
                });
            }

            let Some(new_post) = to_new_post(feed.id, item, &mut report) else {
                continue;
            };

            match posts.create_or_ignore(&new_post).await? {
                Some(_) => {
                    report.inserted += 1;
                    if new_post.published_at.is_none() {
                        report.undated += 1;
                    }
                }
                None => report.duplicates += 1,
            }
        }

        if report.inserted > 0 {
            info!("Feed {} updated: {} new post(s)", feed.id, report.inserted);
        } else {
            debug!("Feed {} updated: no new posts", feed.id);
        }

        Ok(CycleOutcome::Ingested {
            feed_id: feed.id,
            report,
        })
    }
}

/// Turn a parsed item into a post, or `None` if it has no link.
fn to_new_post(feed_id: i64, item: ParsedItem, report: &mut IngestReport) -> Option<NewPost> {
    let link = item.link.trim();
    if link.is_empty() {
        debug!("Skipping item without link in feed {}: {:?}", feed_id, item.title);
        report.skipped += 1;
        return None;
    }

    let title = match item.title.trim() {
        "" => UNTITLED,
        title => title,
    };
    let mut post = NewPost::new(feed_id, title, link);

    let description = item.description.trim();
    if !description.is_empty() {
        post = post.with_description(description);
    }

    match item.pub_date.as_deref().map(parse_pub_date) {
        Some(Ok(published_at)) => post = post.with_published_at(published_at),
        Some(Err(e)) => debug!("Storing {} without publication time: {}", link, e),
        None => {}
    }

    Some(post)
}
