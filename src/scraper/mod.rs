//! Feed scraping for Gator.
//!
//! - `fetcher`: HTTP retrieval and RSS parsing
//! - `date`: publication date layouts
//! - `selection`: which feed is fetched next
//! - `scheduler`: the timed scrape loop

pub mod date;
pub mod fetcher;
pub mod scheduler;
pub mod selection;
pub mod types;

pub use date::parse_pub_date;
pub use fetcher::{parse_feed, validate_url, FeedSource, HttpFetcher};
pub use scheduler::{parse_interval, Scraper, DEFAULT_MAX_ITEMS_PER_CYCLE};
pub use selection::{fetch_priority, select_next_feed};
pub use types::{CycleOutcome, IngestReport, ParsedFeed, ParsedItem};
