//! Feed service for Gator.
//!
//! High-level feed and follow operations. Every operation takes the acting
//! user's ID explicitly.

use tracing::info;

use crate::datetime::now_db_timestamp;
use crate::db::{is_unique_violation, Database, UserRepository};
use crate::feed::repository::{FeedFollowRepository, FeedRepository};
use crate::feed::types::{
    Feed, FeedFollow, FeedFollowDetail, FeedWithOwner, NewFeed, MAX_FEED_NAME_LENGTH,
};
use crate::scraper::validate_url;
use crate::{GatorError, Result};

/// Service for feed and follow operations.
pub struct FeedService<'a> {
    db: &'a Database,
}

impl<'a> FeedService<'a> {
    /// Create a new FeedService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a feed and follow it on behalf of its creator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user does not exist
    /// - The name is empty or too long
    /// - The URL is not an http(s) URL or is already registered
    pub async fn add_feed(&self, user_id: i64, name: &str, url: &str) -> Result<(Feed, FeedFollow)> {
        self.require_user(user_id).await?;

        let name = name.trim();
        if name.is_empty() {
            return Err(GatorError::Validation("feed name must not be empty".to_string()));
        }
        if name.chars().count() > MAX_FEED_NAME_LENGTH {
            return Err(GatorError::Validation(format!(
                "feed name must be at most {MAX_FEED_NAME_LENGTH} characters"
            )));
        }
        validate_url(url).map_err(|e| GatorError::Validation(e.to_string()))?;

        let new_feed = NewFeed::new(name, url, user_id);
        let now = now_db_timestamp();
        let mut tx = self.db.pool().begin().await?;

        // Feed and creator follow are stored together or not at all
        let inserted = sqlx::query(
            "INSERT INTO feeds (name, url, user_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&new_feed.name)
        .bind(&new_feed.url)
        .bind(new_feed.user_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await;
        let feed_id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(GatorError::Validation(format!(
                    "a feed with URL {} already exists",
                    new_feed.url
                )));
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query(
            "INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let feed = self.get_feed(feed_id).await?;
        let follow = FeedFollowRepository::new(self.db.pool())
            .get(user_id, feed_id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed follow".to_string()))?;

        info!("Feed {} ({}) added by user {}", feed.id, feed.url, user_id);
        Ok((feed, follow))
    }

    /// Get a feed by ID.
    pub async fn get_feed(&self, feed_id: i64) -> Result<Feed> {
        FeedRepository::new(self.db.pool())
            .get_by_id(feed_id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed".to_string()))
    }

    /// Get a feed by URL.
    pub async fn get_feed_by_url(&self, url: &str) -> Result<Feed> {
        FeedRepository::new(self.db.pool())
            .get_by_url(url)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("feed {url}")))
    }

    /// List every feed with its owner's name.
    pub async fn list_feeds(&self) -> Result<Vec<FeedWithOwner>> {
        FeedRepository::new(self.db.pool()).list_with_owner().await
    }

    /// Follow a feed.
    ///
    /// A second follow of the same feed fails with
    /// `GatorError::DuplicateFollow`; callers may treat it as already done.
    pub async fn follow(&self, user_id: i64, feed_id: i64) -> Result<FeedFollow> {
        self.require_user(user_id).await?;
        self.get_feed(feed_id).await?;

        FeedFollowRepository::new(self.db.pool())
            .create(user_id, feed_id)
            .await
    }

    /// Follow a feed identified by URL.
    pub async fn follow_by_url(&self, user_id: i64, url: &str) -> Result<(Feed, FeedFollow)> {
        let feed = self.get_feed_by_url(url).await?;
        let follow = self.follow(user_id, feed.id).await?;
        Ok((feed, follow))
    }

    /// Unfollow a feed.
    ///
    /// Returns false, not an error, when the user was not following it.
    pub async fn unfollow(&self, user_id: i64, feed_id: i64) -> Result<bool> {
        FeedFollowRepository::new(self.db.pool())
            .delete(user_id, feed_id)
            .await
    }

    /// Unfollow a feed identified by URL.
    pub async fn unfollow_by_url(&self, user_id: i64, url: &str) -> Result<bool> {
        let feed = self.get_feed_by_url(url).await?;
        self.unfollow(user_id, feed.id).await
    }

    /// List a user's follows.
    pub async fn list_follows(&self, user_id: i64) -> Result<Vec<FeedFollowDetail>> {
        self.require_user(user_id).await?;
        FeedFollowRepository::new(self.db.pool())
            .list_for_user(user_id)
            .await
    }

    /// Fail with `NotFound` unless the user exists.
    pub async fn require_user(&self, user_id: i64) -> Result<()> {
        UserRepository::new(self.db.pool())
            .get_by_id(user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| GatorError::NotFound("user".to_string()))
    }
}
