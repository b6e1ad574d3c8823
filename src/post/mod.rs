//! Post store and browse view for Gator.

pub mod repository;
pub mod service;
pub mod types;

pub use repository::PostRepository;
pub use service::{parse_limit, PostService};
pub use types::{NewPost, Post, PostWithFeed, DEFAULT_BROWSE_LIMIT, MAX_DESCRIPTION_LENGTH};
