//! Command-line interface for Gator.
//!
//! Each subcommand is a handler on `App` that writes its report to the given
//! writer. The logged-in user is kept in the `[session]` table of the config
//! file and resolved to a `User` before any user-scoped operation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::datetime::format_utc_datetime_default;
use crate::db::{Database, NewUser, User, UserRepository};
use crate::feed::FeedService;
use crate::post::{parse_limit, PostService};
use crate::scraper::{fetch_priority, HttpFetcher, Scraper};
use crate::{GatorError, Result};

/// RSS feed aggregator.
#[derive(Debug, Parser)]
#[command(name = "gator", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, env = "GATOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a user and log in as them
    Register {
        /// User name
        name: String,
    },

    /// Log in as an existing user
    Login {
        /// User name
        name: String,
    },

    /// Delete all users and everything they own
    Reset,

    /// List users
    Users,

    /// Add a feed and follow it
    #[command(name = "addfeed")]
    AddFeed {
        /// Display name of the feed
        name: String,
        /// Feed URL
        url: String,
    },

    /// List all feeds in fetch order
    Feeds,

    /// Follow an existing feed
    Follow {
        /// Feed URL
        url: String,
    },

    /// List the feeds the current user follows
    Following,

    /// Stop following a feed
    Unfollow {
        /// Feed URL
        url: String,
    },

    /// Show recent posts from followed feeds
    Browse {
        /// Number of posts to show (default 2)
        limit: Option<String>,
    },

    /// Scrape feeds continuously until interrupted
    Agg {
        /// Time between requests, e.g. 30s, 1m, 1h (default: `[scraper].interval`)
        interval: Option<String>,
    },
}

/// Return a token that is cancelled on Ctrl-C.
pub fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, shutting down"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
        child.cancel();
    });
    token
}

/// Command context: configuration, its file and the database.
pub struct App {
    config: Config,
    config_path: PathBuf,
    db: Arc<Database>,
}

impl App {
    /// Create a new App.
    pub fn new(config: Config, config_path: impl Into<PathBuf>, db: Arc<Database>) -> Self {
        Self {
            config,
            config_path: config_path.into(),
            db,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one command.
    pub async fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Register { name } => self.register(&name, out).await,
            Command::Login { name } => self.login(&name, out).await,
            Command::Reset => self.reset(out).await,
            Command::Users => self.users(out).await,
            Command::AddFeed { name, url } => self.add_feed(&name, &url, out).await,
            Command::Feeds => self.feeds(out).await,
            Command::Follow { url } => self.follow(&url, out).await,
            Command::Following => self.following(out).await,
            Command::Unfollow { url } => self.unfollow(&url, out).await,
            Command::Browse { limit } => self.browse(limit.as_deref(), out).await,
            Command::Agg { interval } => {
                self.agg(interval.as_deref(), shutdown_on_ctrl_c(), out)
                    .await
            }
        }
    }

    /// Resolve the logged-in user.
    pub async fn require_current_user(&self) -> Result<User> {
        let name = self.config.session.current_user.as_deref().ok_or_else(|| {
            GatorError::Validation("no user logged in; run `gator login <name>` first".to_string())
        })?;

        UserRepository::new(self.db.pool())
            .get_by_name(name)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("user {name:?}")))
    }

    pub async fn register<W: Write>(&mut self, name: &str, out: &mut W) -> Result<()> {
        let user = UserRepository::new(self.db.pool())
            .create(&NewUser::new(name))
            .await?;
        self.set_current_user(&user.name)?;

        info!("Registered user {} ({})", user.name, user.id);
        writeln!(out, "User {} created and logged in", user.name)?;
        Ok(())
    }

    pub async fn login<W: Write>(&mut self, name: &str, out: &mut W) -> Result<()> {
        let user = UserRepository::new(self.db.pool())
            .get_by_name(name)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("user {name:?}")))?;
        self.set_current_user(&user.name)?;

        writeln!(out, "Logged in as {}", user.name)?;
        Ok(())
    }

    pub async fn reset<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let removed = UserRepository::new(self.db.pool()).delete_all().await?;

        warn!("Reset removed {} user(s)", removed);
        writeln!(out, "Removed {} user(s) and their feeds", removed)?;
        Ok(())
    }

    pub async fn users<W: Write>(&self, out: &mut W) -> Result<()> {
        let users = UserRepository::new(self.db.pool()).list().await?;
        let current = self.config.session.current_user.as_deref();

        for user in users {
            if Some(user.name.as_str()) == current {
                writeln!(out, "* {} (current)", user.name)?;
            } else {
                writeln!(out, "* {}", user.name)?;
            }
        }
        Ok(())
    }

    pub async fn add_feed<W: Write>(&self, name: &str, url: &str, out: &mut W) -> Result<()> {
        let user = self.require_current_user().await?;
        let (feed, _) = FeedService::new(&self.db).add_feed(user.id, name, url).await?;

        writeln!(out, "Feed added and followed:")?;
        writeln!(out, "  ID:   {}", feed.id)?;
        writeln!(out, "  Name: {}", feed.name)?;
        writeln!(out, "  URL:  {}", feed.url)?;
        Ok(())
    }

    pub async fn feeds<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut feeds = FeedService::new(&self.db).list_feeds().await?;
        feeds.sort_by(|a, b| fetch_priority(&a.feed, &b.feed));

        if feeds.is_empty() {
            writeln!(out, "No feeds yet")?;
            return Ok(());
        }

        let tz = &self.config.display.timezone;
        for entry in feeds {
            let fetched = entry
                .feed
                .last_fetched_at
                .map(|t| format_utc_datetime_default(&t, tz))
                .unwrap_or_else(|| "never".to_string());
            writeln!(
                out,
                "* {} ({}) added by {}, last fetched {}",
                entry.feed.name, entry.feed.url, entry.owner_name, fetched
            )?;
        }
        Ok(())
    }

    pub async fn follow<W: Write>(&self, url: &str, out: &mut W) -> Result<()> {
        let user = self.require_current_user().await?;
        let (feed, _) = FeedService::new(&self.db).follow_by_url(user.id, url).await?;

        writeln!(out, "{} now follows {}", user.name, feed.name)?;
        Ok(())
    }

    pub async fn following<W: Write>(&self, out: &mut W) -> Result<()> {
        let user = self.require_current_user().await?;
        let follows = FeedService::new(&self.db).list_follows(user.id).await?;

        if follows.is_empty() {
            writeln!(out, "{} does not follow any feeds", user.name)?;
            return Ok(());
        }
        for follow in follows {
            writeln!(out, "* {} ({})", follow.feed_name, follow.feed_url)?;
        }
        Ok(())
    }

    pub async fn unfollow<W: Write>(&self, url: &str, out: &mut W) -> Result<()> {
        let user = self.require_current_user().await?;
        let removed = FeedService::new(&self.db).unfollow_by_url(user.id, url).await?;

        if removed {
            writeln!(out, "{} unfollowed {}", user.name, url)?;
        } else {
            writeln!(out, "{} was not following {}", user.name, url)?;
        }
        Ok(())
    }

    pub async fn browse<W: Write>(&self, limit: Option<&str>, out: &mut W) -> Result<()> {
        let limit = parse_limit(limit)?;
        let user = self.require_current_user().await?;
        let posts = PostService::new(&self.db).browse(user.id, limit).await?;

        if posts.is_empty() {
            writeln!(out, "No posts yet")?;
            return Ok(());
        }

        let tz = &self.config.display.timezone;
        for entry in posts {
            let published = entry
                .post
                .published_at
                .map(|t| format_utc_datetime_default(&t, tz))
                .unwrap_or_else(|| "undated".to_string());
            writeln!(out, "{} from {}", published, entry.feed_name)?;
            writeln!(out, "--- {} ---", entry.post.title)?;
            if let Some(description) = &entry.post.description {
                writeln!(out, "    {}", description)?;
            }
            writeln!(out, "Link: {}", entry.post.url)?;
            writeln!(out, "=====================================")?;
        }
        Ok(())
    }

    /// Scrape feeds every `interval` until `shutdown` is cancelled.
    ///
    /// Without an interval argument the configured `[scraper].interval` is used.
    pub async fn agg<W: Write>(
        &self,
        interval: Option<&str>,
        shutdown: CancellationToken,
        out: &mut W,
    ) -> Result<()> {
        let mut scraper_config = self.config.scraper.clone();
        if let Some(interval) = interval {
            scraper_config.interval = interval.to_string();
        }
        let fetcher = HttpFetcher::new(&scraper_config)?;
        let scraper = Scraper::from_config(self.db.clone(), fetcher, &scraper_config)?;

        writeln!(
            out,
            "Collecting feeds every {}",
            humantime::format_duration(scraper.interval())
        )?;
        out.flush()?;

        scraper.run(shutdown).await;
        Ok(())
    }

    /// Persist the session user without writing back env overrides.
    fn set_current_user(&mut self, name: &str) -> Result<()> {
        let mut on_disk = load_file_config(&self.config_path)?;
        on_disk.set_current_user(name);
        on_disk.save(&self.config_path)?;

        self.config.set_current_user(name);
        Ok(())
    }
}

fn load_file_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        Ok(Config::default())
    }
}
