//! Feed and follow types for Gator.

use chrono::{DateTime, Utc};

/// Maximum length of a feed name.
pub const MAX_FEED_NAME_LENGTH: usize = 200;

/// An RSS feed registered by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// Display name chosen by the owner.
    pub name: String,
    /// Feed URL (unique).
    pub url: String,
    /// User ID of the owner.
    pub user_id: i64,
    /// Last time the scraper picked this feed; None until the first scrape.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
    /// When the feed was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    /// Whether the scraper has ever picked this feed.
    pub fn was_fetched(&self) -> bool {
        self.last_fetched_at.is_some()
    }
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Display name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Owner user ID.
    pub user_id: i64,
}

impl NewFeed {
    /// Create a new feed.
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: i64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// Feed joined with the owner's name, for listings.
#[derive(Debug, Clone)]
pub struct FeedWithOwner {
    /// The feed.
    pub feed: Feed,
    /// Name of the user who added it.
    pub owner_name: String,
}

/// A user's subscription to a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFollow {
    /// Follow ID.
    pub id: i64,
    /// Following user.
    pub user_id: i64,
    /// Followed feed.
    pub feed_id: i64,
    /// When the follow was created.
    pub created_at: DateTime<Utc>,
    /// When the follow was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Follow joined with feed and user names, for listings.
#[derive(Debug, Clone)]
pub struct FeedFollowDetail {
    /// The follow row.
    pub follow: FeedFollow,
    /// Feed name.
    pub feed_name: String,
    /// Feed URL.
    pub feed_url: String,
    /// Following user's name.
    pub user_name: String,
}
