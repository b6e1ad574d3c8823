//! Post types for Gator.

use chrono::{DateTime, Utc};

/// Maximum length for a post description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

/// Number of posts returned by browse when no limit is given.
pub const DEFAULT_BROWSE_LIMIT: i64 = 2;

/// An item ingested from a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Post ID.
    pub id: i64,
    /// Feed this post came from.
    pub feed_id: i64,
    /// Item title.
    pub title: String,
    /// Link to the article (unique across all posts).
    pub url: String,
    /// Item description.
    pub description: Option<String>,
    /// Publication time; None when the feed's date could not be parsed.
    pub published_at: Option<DateTime<Utc>>,
    /// When the post was stored.
    pub created_at: DateTime<Utc>,
    /// When the post was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New post for creation.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Feed ID.
    pub feed_id: i64,
    /// Item title.
    pub title: String,
    /// Link to the article.
    pub url: String,
    /// Item description.
    pub description: Option<String>,
    /// Publication time.
    pub published_at: Option<DateTime<Utc>>,
}

impl NewPost {
    /// Create a new post.
    pub fn new(feed_id: i64, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            feed_id,
            title: title.into(),
            url: url.into(),
            description: None,
            published_at: None,
        }
    }

    /// Set the description, truncated to `MAX_DESCRIPTION_LENGTH` characters.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let desc = description.into();
        if desc.chars().count() > MAX_DESCRIPTION_LENGTH {
            self.description = Some(desc.chars().take(MAX_DESCRIPTION_LENGTH).collect());
        } else {
            self.description = Some(desc);
        }
        self
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Post joined with the name of its feed, as returned by browse.
#[derive(Debug, Clone)]
pub struct PostWithFeed {
    /// The post.
    pub post: Post,
    /// Name of the feed.
    pub feed_name: String,
}
