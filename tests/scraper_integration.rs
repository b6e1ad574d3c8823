//! Scraper integration tests.
//!
//! Drive the scheduler against a local HTTP server and check what ends up in
//! the post store.

mod common;

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use common::{
    create_test_feed, create_test_user, rss_document, setup_test_db, test_fetcher, TestItem,
};
use gator::error::FetchError;
use gator::feed::FeedRepository;
use gator::post::PostRepository;
use gator::scraper::IngestReport;
use gator::{CycleOutcome, PostService, Scraper};

#[tokio::test]
async fn test_two_feeds_round_robin() {
    let mut server = mockito::Server::new_async().await;
    let feed_a = server
        .mock("GET", "/a.xml")
        .with_status(200)
        .with_body(rss_document(
            "A",
            &[TestItem {
                title: "A1",
                link: "https://a.example/1",
                pub_date: Some("Mon, 02 Jan 2006 15:04:05 -0700"),
            }],
        ))
        .expect(1)
        .create_async()
        .await;
    let feed_b = server
        .mock("GET", "/b.xml")
        .with_status(200)
        .with_body(rss_document(
            "B",
            &[TestItem {
                title: "B1",
                link: "https://b.example/1",
                pub_date: Some("2006-01-03"),
            }],
        ))
        .expect(1)
        .create_async()
        .await;

    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "alice").await;
    let a = create_test_feed(&db, user_id, "A", &format!("{}/a.xml", server.url())).await;
    let b = create_test_feed(&db, user_id, "B", &format!("{}/b.xml", server.url())).await;

    let scraper = Scraper::new(db.clone(), test_fetcher(), Duration::from_secs(60));
    let token = CancellationToken::new();

    let first = scraper.scrape_once(&token).await.unwrap();
    let second = scraper.scrape_once(&token).await.unwrap();
    assert_eq!(first.feed_id(), Some(a));
    assert_eq!(second.feed_id(), Some(b));

    feed_a.assert_async().await;
    feed_b.assert_async().await;

    let feeds = FeedRepository::new(db.pool());
    let a_fetched = feeds.get_by_id(a).await.unwrap().unwrap().last_fetched_at;
    let b_fetched = feeds.get_by_id(b).await.unwrap().unwrap().last_fetched_at;
    assert!(a_fetched.is_some() && b_fetched.is_some());
    assert!(a_fetched <= b_fetched);

    let posts = PostService::new(&db).browse(user_id, Some(10)).await.unwrap();
    let titles: Vec<&str> = posts.iter().map(|p| p.post.title.as_str()).collect();
    assert_eq!(titles, vec!["B1", "A1"]);
    assert_eq!(posts[0].feed_name, "B");
    assert_eq!(posts[1].post.description.as_deref(), Some("<p>body</p>"));
}

#[tokio::test]
async fn test_never_fetched_feed_wins_over_stale_one() {
    let mut server = mockito::Server::new_async().await;
    let never_fetched = server
        .mock("GET", "/a.xml")
        .with_status(200)
        .with_body(rss_document("A", &[]))
        .expect(1)
        .create_async()
        .await;
    let stale = server
        .mock("GET", "/b.xml")
        .with_status(200)
        .with_body(rss_document("B", &[]))
        .expect(0)
        .create_async()
        .await;

    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "alice").await;
    // B is inserted first, so only the fetch time can put A ahead of it.
    let b = create_test_feed(&db, user_id, "B", &format!("{}/b.xml", server.url())).await;
    let a = create_test_feed(&db, user_id, "A", &format!("{}/a.xml", server.url())).await;

    let feeds = FeedRepository::new(db.pool());
    feeds
        .mark_fetched(b, Utc::now() - chrono::Duration::hours(1))
        .await
        .unwrap();
    let b_before = feeds.get_by_id(b).await.unwrap().unwrap().last_fetched_at;

    let scraper = Scraper::new(db.clone(), test_fetcher(), Duration::from_secs(60));
    let outcome = scraper.scrape_once(&CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.feed_id(), Some(a));
    never_fetched.assert_async().await;
    stale.assert_async().await;

    let a_after = feeds.get_by_id(a).await.unwrap().unwrap().last_fetched_at;
    let b_after = feeds.get_by_id(b).await.unwrap().unwrap().last_fetched_at;
    assert!(a_after.is_some());
    assert!(a_after > b_after);
    assert_eq!(b_after, b_before);
}

#[tokio::test]
async fn test_refetch_does_not_duplicate_posts() {
    let mut server = mockito::Server::new_async().await;
    let body = rss_document(
        "Blog",
        &[
            TestItem {
                title: "One",
                link: "https://blog.example/1",
                pub_date: None,
            },
            TestItem {
                title: "Two",
                link: "https://blog.example/2",
                pub_date: Some("garbage"),
            },
        ],
    );
    let _mock = server
        .mock("GET", "/rss")
        .with_status(200)
        .with_body(body)
        .expect(2)
        .create_async()
        .await;

    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "alice").await;
    let feed_id = create_test_feed(&db, user_id, "Blog", &format!("{}/rss", server.url())).await;

    let scraper = Scraper::new(db.clone(), test_fetcher(), Duration::from_secs(60));
    let token = CancellationToken::new();
    scraper.scrape_once(&token).await.unwrap();
    let again = scraper.scrape_once(&token).await.unwrap();

    assert_eq!(
        again,
        CycleOutcome::Ingested {
            feed_id,
            report: IngestReport {
                inserted: 0,
                duplicates: 2,
                skipped: 0,
                undated: 0,
            },
        }
    );
    assert_eq!(
        PostRepository::new(db.pool())
            .count_by_feed(feed_id)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_failed_fetch_is_retried_next_round() {
    let mut server = mockito::Server::new_async().await;
    let _broken = server
        .mock("GET", "/broken")
        .with_status(503)
        .create_async()
        .await;
    let _ok = server
        .mock("GET", "/ok")
        .with_status(200)
        .with_body(rss_document("Ok", &[]))
        .create_async()
        .await;

    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "alice").await;
    let broken =
        create_test_feed(&db, user_id, "Broken", &format!("{}/broken", server.url())).await;
    let ok = create_test_feed(&db, user_id, "Ok", &format!("{}/ok", server.url())).await;

    let scraper = Scraper::new(db.clone(), test_fetcher(), Duration::from_secs(60));
    let token = CancellationToken::new();

    assert_eq!(
        scraper.scrape_once(&token).await.unwrap(),
        CycleOutcome::FetchFailed {
            feed_id: broken,
            error: FetchError::Status(503),
        }
    );
    assert_eq!(scraper.scrape_once(&token).await.unwrap().feed_id(), Some(ok));
    assert_eq!(
        scraper.scrape_once(&token).await.unwrap().feed_id(),
        Some(broken)
    );
}

#[tokio::test]
async fn test_malformed_feed_stores_nothing() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/feed")
        .with_status(200)
        .with_body("<rss><channel><item><title>Half")
        .create_async()
        .await;

    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "alice").await;
    let feed_id = create_test_feed(&db, user_id, "Bad", &format!("{}/feed", server.url())).await;

    let scraper = Scraper::new(db.clone(), test_fetcher(), Duration::from_secs(60));
    let outcome = scraper.scrape_once(&CancellationToken::new()).await.unwrap();

    assert!(matches!(
        outcome,
        CycleOutcome::FetchFailed {
            error: FetchError::Parse(_),
            ..
        }
    ));
    assert_eq!(
        PostRepository::new(db.pool())
            .count_by_feed(feed_id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_run_until_cancelled() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/rss")
        .with_status(200)
        .with_body(rss_document(
            "Blog",
            &[TestItem {
                title: "One",
                link: "https://blog.example/1",
                pub_date: None,
            }],
        ))
        .create_async()
        .await;

    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "alice").await;
    let feed_id = create_test_feed(&db, user_id, "Blog", &format!("{}/rss", server.url())).await;

    let scraper = Scraper::new(db.clone(), test_fetcher(), Duration::from_millis(20));
    let token = CancellationToken::new();
    let handle = {
        let token = token.clone();
        tokio::spawn(async move { scraper.run(token).await })
    };

    tokio::time::sleep(Duration::from_millis(150)).await;
    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scraper did not stop")
        .unwrap();

    assert_eq!(
        PostRepository::new(db.pool())
            .count_by_feed(feed_id)
            .await
            .unwrap(),
        1
    );
}
