//! User model for Gator.

use chrono::{DateTime, Utc};

/// Maximum length of a user name.
pub const MAX_NAME_LENGTH: usize = 64;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Display name (unique).
    pub name: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// New user for registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
}

impl NewUser {
    /// Create a new user request.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Check the name is non-empty, bounded and free of whitespace.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("user name must not be empty".to_string());
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(format!(
                "user name must be at most {MAX_NAME_LENGTH} characters"
            ));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err("user name must not contain whitespace".to_string());
        }
        Ok(())
    }
}
