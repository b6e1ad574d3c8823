//! Feed and follow repositories for Gator.

use chrono::{DateTime, Utc};

use super::types::{Feed, FeedFollow, FeedFollowDetail, FeedWithOwner, NewFeed};
use crate::datetime::{now_db_timestamp, parse_db_timestamp, to_db_timestamp};
use crate::db::{is_unique_violation, DbPool};
use crate::{GatorError, Result};

const FEED_COLUMNS: &str = "f.id, f.name, f.url, f.user_id, f.last_fetched_at, f.created_at, f.updated_at";

/// Row type for a feed from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedRow {
    id: i64,
    name: String,
    url: String,
    user_id: i64,
    last_fetched_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            name: row.name,
            url: row.url,
            user_id: row.user_id,
            last_fetched_at: row.last_fetched_at.and_then(|s| parse_db_timestamp(&s)),
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for a feed with its owner's name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedWithOwnerRow {
    #[sqlx(flatten)]
    feed: FeedRow,
    owner_name: String,
}

impl From<FeedWithOwnerRow> for FeedWithOwner {
    fn from(row: FeedWithOwnerRow) -> Self {
        FeedWithOwner {
            feed: row.feed.into(),
            owner_name: row.owner_name,
        }
    }
}

/// Row type for a follow from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedFollowRow {
    id: i64,
    user_id: i64,
    feed_id: i64,
    created_at: String,
    updated_at: String,
}

impl From<FeedFollowRow> for FeedFollow {
    fn from(row: FeedFollowRow) -> Self {
        FeedFollow {
            id: row.id,
            user_id: row.user_id,
            feed_id: row.feed_id,
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for a follow joined with names.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedFollowDetailRow {
    #[sqlx(flatten)]
    follow: FeedFollowRow,
    feed_name: String,
    feed_url: String,
    user_name: String,
}

impl From<FeedFollowDetailRow> for FeedFollowDetail {
    fn from(row: FeedFollowDetailRow) -> Self {
        FeedFollowDetail {
            follow: row.follow.into(),
            feed_name: row.feed_name,
            feed_url: row.feed_url,
            user_name: row.user_name,
        }
    }
}

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new feed.
    ///
    /// A URL that is already registered is a validation error.
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        let now = now_db_timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO feeds (name, url, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&feed.name)
        .bind(&feed.url)
        .bind(feed.user_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await;

        let id = match result {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(GatorError::Validation(format!(
                    "a feed with URL {} already exists",
                    feed.url
                )));
            }
            Err(e) => return Err(e.into()),
        };

        self.get_by_id(id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed".to_string()))
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds f WHERE f.id = $1");
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds f WHERE f.url = $1");
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Feed::from))
    }

    /// List all feeds in registration order.
    pub async fn list_all(&self) -> Result<Vec<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds f ORDER BY f.id ASC");
        let rows = sqlx::query_as::<_, FeedRow>(&query)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Feed::from).collect())
    }

    /// List all feeds with their owner's name, in registration order.
    pub async fn list_with_owner(&self) -> Result<Vec<FeedWithOwner>> {
        let query = format!(
            r#"
            SELECT {FEED_COLUMNS}, u.name AS owner_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.id ASC
            "#
        );
        let rows = sqlx::query_as::<_, FeedWithOwnerRow>(&query)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(FeedWithOwner::from).collect())
    }

    /// Get the feed the scraper should fetch next.
    ///
    /// Least recently fetched first; never-fetched feeds come before all
    /// others; ties go to the oldest feed.
    pub async fn next_to_fetch(&self) -> Result<Option<Feed>> {
        let query = format!(
            r#"
            SELECT {FEED_COLUMNS}
            FROM feeds f
            ORDER BY f.last_fetched_at ASC NULLS FIRST, f.id ASC
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Feed::from))
    }

    /// Set the last fetched timestamp.
    ///
    /// The timestamp never moves backwards: an update older than the stored
    /// value leaves the row untouched and returns false.
    pub async fn mark_fetched(&self, id: i64, fetched_at: DateTime<Utc>) -> Result<bool> {
        let fetched_at = to_db_timestamp(&fetched_at);
        let result = sqlx::query(
            r#"
            UPDATE feeds
            SET last_fetched_at = $1, updated_at = $2
            WHERE id = $3 AND (last_fetched_at IS NULL OR last_fetched_at <= $4)
            "#,
        )
        .bind(&fetched_at)
        .bind(&fetched_at)
        .bind(id)
        .bind(&fetched_at)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all feeds.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }
}

/// Repository for follow operations.
pub struct FeedFollowRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedFollowRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a follow.
    ///
    /// Following the same feed twice fails with `GatorError::DuplicateFollow`.
    pub async fn create(&self, user_id: i64, feed_id: i64) -> Result<FeedFollow> {
        let now = now_db_timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(GatorError::DuplicateFollow { user_id, feed_id });
            }
            Err(e) => return Err(e.into()),
        }

        self.get(user_id, feed_id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed follow".to_string()))
    }

    /// Get the follow for a user and feed.
    pub async fn get(&self, user_id: i64, feed_id: i64) -> Result<Option<FeedFollow>> {
        let row = sqlx::query_as::<_, FeedFollowRow>(
            r#"
            SELECT id, user_id, feed_id, created_at, updated_at
            FROM feed_follows
            WHERE user_id = $1 AND feed_id = $2
            "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(FeedFollow::from))
    }

    /// Delete the follow for a user and feed.
    ///
    /// Returns false when there was nothing to delete.
    pub async fn delete(&self, user_id: i64, feed_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = $1 AND feed_id = $2")
            .bind(user_id)
            .bind(feed_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List a user's follows with feed and user names, oldest first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<FeedFollowDetail>> {
        let rows = sqlx::query_as::<_, FeedFollowDetailRow>(
            r#"
            SELECT ff.id, ff.user_id, ff.feed_id, ff.created_at, ff.updated_at,
                   f.name AS feed_name, f.url AS feed_url, u.name AS user_name
            FROM feed_follows ff
            JOIN feeds f ON f.id = ff.feed_id
            JOIN users u ON u.id = ff.user_id
            WHERE ff.user_id = $1
            ORDER BY ff.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedFollowDetail::from).collect())
    }

    /// Count a user's follows.
    pub async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feed_follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }
}
