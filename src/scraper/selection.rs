//! Fetch order for feeds.
//!
//! Mirrors the ordering of `FeedRepository::next_to_fetch`: never-fetched
//! feeds first, then the least recently fetched, ties broken by ID.

use std::cmp::Ordering;

use crate::feed::Feed;

/// Compare two feeds by how urgently they should be fetched.
pub fn fetch_priority(a: &Feed, b: &Feed) -> Ordering {
    // `None` sorts before `Some`, so unfetched feeds come first.
    a.last_fetched_at
        .cmp(&b.last_fetched_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// The feed the next scrape cycle would pick.
pub fn select_next_feed(feeds: &[Feed]) -> Option<&Feed> {
    feeds.iter().min_by(|a, b| fetch_priority(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, UserRepository};
    use crate::feed::{FeedRepository, NewFeed};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn feed(id: i64, last_fetched_at: Option<DateTime<Utc>>) -> Feed {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Feed {
            id,
            name: format!("feed {id}"),
            url: format!("https://example.com/{id}"),
            user_id: 1,
            last_fetched_at,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_unfetched_first() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let feeds = vec![feed(1, Some(t)), feed(2, None)];
        assert_eq!(select_next_feed(&feeds).map(|f| f.id), Some(2));
    }

    #[test]
    fn test_oldest_fetch_first() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let feeds = vec![
            feed(1, Some(t + Duration::minutes(5))),
            feed(2, Some(t)),
            feed(3, Some(t + Duration::minutes(1))),
        ];
        assert_eq!(select_next_feed(&feeds).map(|f| f.id), Some(2));
    }

    #[test]
    fn test_ties_broken_by_id() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let feeds = vec![feed(7, Some(t)), feed(3, Some(t)), feed(5, None), feed(4, None)];
        assert_eq!(select_next_feed(&feeds).map(|f| f.id), Some(4));

        let mut sorted = feeds.clone();
        sorted.sort_by(fetch_priority);
        let ids: Vec<i64> = sorted.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![4, 5, 3, 7]);
    }

    #[test]
    fn test_empty() {
        assert!(select_next_feed(&[]).is_none());
    }

    #[tokio::test]
    async fn test_agrees_with_repository() {
        let db = Database::open_in_memory().await.unwrap();
        let user_id = UserRepository::new(db.pool())
            .create(&NewUser::new("alice"))
            .await
            .unwrap()
            .id;
        let repo = FeedRepository::new(db.pool());
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        let mut ids = Vec::new();
        for i in 0..4 {
            let f = repo
                .create(&NewFeed::new(format!("F{i}"), format!("https://f{i}.example/rss"), user_id))
                .await
                .unwrap();
            ids.push(f.id);
        }
        repo.mark_fetched(ids[0], t + Duration::minutes(2)).await.unwrap();
        repo.mark_fetched(ids[2], t).await.unwrap();

        let all = repo.list_all().await.unwrap();
        let expected = select_next_feed(&all).map(|f| f.id);
        let actual = repo.next_to_fetch().await.unwrap().map(|f| f.id);
        assert_eq!(expected, actual);
        assert_eq!(actual, Some(ids[1]));
    }
}
