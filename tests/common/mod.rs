//! Test helpers for integration tests.
//!
//! Provides database setup, canned RSS documents and a fetcher pointed at a
//! local mock server.

#![allow(dead_code)]

use std::sync::Arc;

use gator::config::ScraperConfig;
use gator::db::{NewUser, UserRepository};
use gator::{Database, FeedService, HttpFetcher};

/// Open a migrated in-memory database.
pub async fn setup_test_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().await.unwrap())
}

/// Create a test user and return the user ID.
pub async fn create_test_user(db: &Database, name: &str) -> i64 {
    UserRepository::new(db.pool())
        .create(&NewUser::new(name))
        .await
        .unwrap()
        .id
}

/// Add a feed owned (and followed) by `user_id`, returning the feed ID.
pub async fn create_test_feed(db: &Database, user_id: i64, name: &str, url: &str) -> i64 {
    FeedService::new(db)
        .add_feed(user_id, name, url)
        .await
        .unwrap()
        .0
        .id
}

/// HTTP fetcher with short timeouts.
pub fn test_fetcher() -> HttpFetcher {
    let config = ScraperConfig {
        connect_timeout_secs: 2,
        read_timeout_secs: 2,
        total_timeout_secs: 5,
        ..ScraperConfig::default()
    };
    HttpFetcher::new(&config).unwrap()
}

/// An RSS item for `rss_document`.
pub struct TestItem<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub pub_date: Option<&'a str>,
}

/// Build an RSS 2.0 document.
pub fn rss_document(title: &str, items: &[TestItem<'_>]) -> String {
    let mut body = String::new();
    for item in items {
        body.push_str("<item>");
        body.push_str(&format!("<title>{}</title>", item.title));
        body.push_str(&format!("<link>{}</link>", item.link));
        body.push_str("<description><![CDATA[<p>body</p>]]></description>");
        if let Some(date) = item.pub_date {
            body.push_str(&format!("<pubDate>{}</pubDate>", date));
        }
        body.push_str("</item>\n");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
<title>{title}</title>
<link>https://example.com/</link>
<description>Test feed</description>
{body}</channel>
</rss>"#
    )
}
