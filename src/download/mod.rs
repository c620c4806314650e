//! Timeline download
//!
//! `TweetSource` is the seam between the journal processing loop and the
//! network: `TwitterClient` talks to the REST API, tests substitute their own.

mod client;
mod keys;
mod status;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::consts::{RATE_LIMIT_WAIT_SECS, TIMELINE_PAGE_SIZE};
use crate::tweet::TweetEnvelope;

pub use client::TwitterClient;
pub use keys::Keys;
pub use status::{Entities, Status, StatusUser, UrlEntity};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Twitter returned HTTP {0}")]
    Status(u16),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid response from Twitter: {0}")]
    Decode(String),

    #[error("Failed to load keys from {}: {reason}", path.display())]
    Keys { path: PathBuf, reason: String },

    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// A user's timeline, newest first
pub trait TweetSource {
    /// Up to `count` statuses with ids at or below `max_id` (all if None)
    fn user_timeline(
        &self,
        screen_name: &str,
        max_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<Status>, DownloadError>;
}

#[derive(Debug, Clone, Copy)]
pub struct DownloadSettings {
    pub page_size: u32,
    /// Pause before retrying a rate-limited request
    pub rate_limit_wait: Duration,
    pub quiet: bool,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            page_size: TIMELINE_PAGE_SIZE,
            rate_limit_wait: Duration::from_secs(RATE_LIMIT_WAIT_SECS),
            quiet: false,
        }
    }
}

/// Fetch a user's tweets older than `max_id`, page by page, until one older
/// than `min_date` has been seen (it is included) or the timeline runs out.
///
/// Tweets come back in timeline order, newest first. Rate limits are waited
/// out and the same page requested again.
pub fn tweets_for_user(
    source: &dyn TweetSource,
    screen_name: &str,
    max_id: Option<i64>,
    min_date: NaiveDateTime,
    settings: &DownloadSettings,
) -> Result<Vec<TweetEnvelope>, DownloadError> {
    let mut result = Vec::new();
    // max_id is inclusive on the API side
    let mut cursor = max_id.map(|id| id - 1);

    loop {
        let page = match source.user_timeline(screen_name, cursor, settings.page_size) {
            Ok(page) => page,
            Err(DownloadError::RateLimited) => {
                if !settings.quiet {
                    eprintln!(
                        "Rate limited while fetching @{}, waiting {}s",
                        screen_name,
                        settings.rate_limit_wait.as_secs()
                    );
                }
                thread::sleep(settings.rate_limit_wait);
                continue;
            }
            Err(err) => return Err(err),
        };

        if page.is_empty() {
            return Ok(result);
        }

        for status in &page {
            result.push(status.to_tweet());
            if status.created_at < min_date {
                return Ok(result);
            }
        }

        let Some(oldest) = page.iter().map(|s| s.id).min() else {
            return Ok(result);
        };
        let next = oldest - 1;
        if cursor.is_some_and(|c| next >= c) {
            // Source is not making progress
            return Ok(result);
        }
        cursor = Some(next);
    }
}
