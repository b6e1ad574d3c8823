//! Browse service for Gator.

use crate::db::Database;
use crate::feed::FeedService;
use crate::post::repository::PostRepository;
use crate::post::types::{PostWithFeed, DEFAULT_BROWSE_LIMIT};
use crate::{GatorError, Result};

/// Service for reading accumulated posts.
pub struct PostService<'a> {
    db: &'a Database,
}

impl<'a> PostService<'a> {
    /// Create a new PostService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Return up to `limit` posts from the feeds the user follows.
    ///
    /// `limit` defaults to `DEFAULT_BROWSE_LIMIT` and must be positive. An
    /// unknown user is `NotFound`.
    /// Newest publication first, undated posts last.
    pub async fn browse(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<PostWithFeed>> {
        let limit = limit.unwrap_or(DEFAULT_BROWSE_LIMIT);
        if limit <= 0 {
            return Err(GatorError::Validation(format!(
                "limit must be a positive integer, got {limit}"
            )));
        }

        FeedService::new(self.db).require_user(user_id).await?;

        PostRepository::new(self.db.pool())
            .list_for_user(user_id, limit)
            .await
    }
}

/// Parse a browse limit given as a command-line argument.
///
/// A missing argument means the default limit.
pub fn parse_limit(arg: Option<&str>) -> Result<Option<i64>> {
    let Some(arg) = arg else {
        return Ok(None);
    };
    let limit: i64 = arg
        .trim()
        .parse()
        .map_err(|_| GatorError::Validation(format!("invalid limit: {arg:?}")))?;
    if limit <= 0 {
        return Err(GatorError::Validation(format!(
            "limit must be a positive integer, got {limit}"
        )));
    }
    Ok(Some(limit))
}
