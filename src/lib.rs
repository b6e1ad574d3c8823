//! Gator - a personal RSS feed aggregator
//!
//! Users register feeds, follow them, and browse the posts a background
//! scraper collects from them.

pub mod cli;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod post;
pub mod scraper;

pub use cli::{App, Cli, Command};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{DateParseError, FetchError, GatorError, Result};
pub use feed::{Feed, FeedFollow, FeedService};
pub use post::{Post, PostService};
pub use scraper::{CycleOutcome, FeedSource, HttpFetcher, Scraper};
