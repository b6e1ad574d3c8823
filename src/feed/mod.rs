//! Feed store and follow graph for Gator.

pub mod repository;
pub mod service;
pub mod types;

pub use repository::{FeedFollowRepository, FeedRepository};
pub use service::FeedService;
pub use types::{Feed, FeedFollow, FeedFollowDetail, FeedWithOwner, NewFeed, MAX_FEED_NAME_LENGTH};
