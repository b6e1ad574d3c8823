//! Error types for Gator.

use thiserror::Error;

/// Common error type for Gator.
#[derive(Error, Debug)]
pub enum GatorError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant. A store failure aborts
    /// the current command or scrape cycle.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The user already follows the feed.
    #[error("user {user_id} already follows feed {feed_id}")]
    DuplicateFollow {
        /// User ID.
        user_id: i64,
        /// Feed ID.
        feed_id: i64,
    },

    /// Feed retrieval error.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for GatorError {
    fn from(e: sqlx::Error) -> Self {
        GatorError::Database(e.to_string())
    }
}

/// Failure while retrieving or parsing a feed.
///
/// The scraper treats every variant the same way: the cycle ends and the feed
/// is retried when it comes up again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The feed URL cannot be requested.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection, timeout or body read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with something other than 200.
    #[error("unexpected HTTP status: {0}")]
    Status(u16),

    /// The body exceeds the configured maximum.
    #[error("feed too large: {size} bytes (max {max} bytes)")]
    TooLarge {
        /// Observed size.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// The body is not a well-formed RSS document.
    #[error("failed to parse feed: {0}")]
    Parse(String),
}

/// A publication date matched none of the supported layouts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized date: {input:?}")]
pub struct DateParseError {
    /// The trimmed input.
    pub input: String,
}

/// Result type alias for Gator operations.
pub type Result<T> = std::result::Result<T, GatorError>;
