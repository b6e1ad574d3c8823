//! RSS feed fetcher.
//!
//! Fetches feed documents over HTTP with timeouts and a size limit and
//! parses them into `ParsedFeed`.

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, StatusCode};

use crate::config::ScraperConfig;
use crate::error::{FetchError, GatorError, Result};
use crate::scraper::types::{ParsedFeed, ParsedItem};

/// Source of parsed feeds.
///
/// The scheduler only depends on this trait, so tests can substitute a
/// canned source for the network.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> std::result::Result<ParsedFeed, FetchError>;
}

/// HTTP feed fetcher.
pub struct HttpFetcher {
    client: Client,
    max_size: u64,
}

impl HttpFetcher {
    /// Create a fetcher from scraper settings.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| GatorError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_size: config.max_feed_size_bytes,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<ParsedFeed, FetchError> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size {
                return Err(FetchError::TooLarge {
                    size: content_length,
                    max: self.max_size,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if bytes.len() as u64 > self.max_size {
            return Err(FetchError::TooLarge {
                size: bytes.len() as u64,
                max: self.max_size,
            });
        }

        parse_feed(&bytes)
    }
}

/// Check that a feed URL can be requested.
///
/// Only absolute http and https URLs with a host are accepted.
pub fn validate_url(url: &str) -> std::result::Result<(), FetchError> {
    let parsed = url::Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(FetchError::InvalidUrl("URL has no host".to_string()));
    }

    Ok(())
}

/// Parse an RSS document.
///
/// The first `<channel>` is read. Unknown elements are ignored, text and
/// CDATA inside the same element are concatenated.
pub fn parse_feed(bytes: &[u8]) -> std::result::Result<ParsedFeed, FetchError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut channel: Option<ParsedFeed> = None;
    let mut channel_done = false;
    let mut item: Option<ParsedItem> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "channel" if channel.is_none() => channel = Some(ParsedFeed::default()),
                    "item"
                        if !channel_done
                            && item.is_none()
                            && path.last().map(String::as_str) == Some("channel") =>
                    {
                        item = Some(ParsedItem::default())
                    }
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                match path.pop().as_deref() {
                    Some("item") if path.last().map(String::as_str) == Some("channel") => {
                        if let (Some(feed), Some(done)) = (channel.as_mut(), item.take()) {
                            if !channel_done {
                                feed.items.push(done);
                            }
                        }
                    }
                    Some("channel") => channel_done = true,
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                let text = match e.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(_) => String::from_utf8_lossy(&e).into_owned(),
                };
                if !channel_done {
                    append_text(&path, channel.as_mut(), item.as_mut(), &text);
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                if !channel_done {
                    append_text(&path, channel.as_mut(), item.as_mut(), &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FetchError::Parse(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !path.is_empty() {
        return Err(FetchError::Parse(format!(
            "unexpected end of document inside <{}>",
            path.join("/")
        )));
    }

    channel.ok_or_else(|| FetchError::Parse("document has no <channel> element".to_string()))
}

/// Route element text to the matching channel or item field.
fn append_text(
    path: &[String],
    channel: Option<&mut ParsedFeed>,
    item: Option<&mut ParsedItem>,
    text: &str,
) {
    let [.., parent, field] = path else {
        return;
    };

    match (parent.as_str(), item, channel) {
        ("item", Some(item), _) => {
            let target = match field.as_str() {
                "title" => &mut item.title,
                "link" => &mut item.link,
                "description" => &mut item.description,
                "pubDate" => item.pub_date.get_or_insert_with(String::new),
                _ => return,
            };
            target.push_str(text);
        }
        ("channel", _, Some(channel)) => {
            let target = match field.as_str() {
                "title" => &mut channel.title,
                "link" => &mut channel.link,
                "description" => &mut channel.description,
                _ => return,
            };
            target.push_str(text);
        }
        _ => {}
    }
}
