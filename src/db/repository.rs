//! User repository for Gator.

use chrono::Utc;

use super::user::{NewUser, User};
use super::{is_unique_violation, DbPool};
use crate::datetime::{now_db_timestamp, parse_db_timestamp};
use crate::{GatorError, Result};

/// Row type for a user from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    created_at: String,
    updated_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Register a new user.
    ///
    /// Fails with a validation error when the name is invalid or taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        new_user.validate().map_err(GatorError::Validation)?;

        let now = now_db_timestamp();
        let result = sqlx::query("INSERT INTO users (name, created_at, updated_at) VALUES ($1, $2, $3)")
            .bind(&new_user.name)
            .bind(&now)
            .bind(&now)
            .execute(self.pool)
            .await;

        let id = match result {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(GatorError::Validation(format!(
                    "user {} already exists",
                    new_user.name
                )));
            }
            Err(e) => return Err(e.into()),
        };

        self.get_by_id(id)
            .await?
            .ok_or_else(|| GatorError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Get a user by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// List all users in registration order.
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, created_at, updated_at FROM users ORDER BY id ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Delete every user.
    ///
    /// Feeds, follows and posts go with them through cascading foreign keys.
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users").execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}
