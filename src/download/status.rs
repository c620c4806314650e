//! Timeline statuses as returned by the REST API, and their conversion into
//! the spider's tweet representation

use chrono::{DateTime, Duration, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use crate::consts::TWITTER_DATE_FORMAT;
use crate::tweet::{TweetBody, TweetEnvelope, UrlCard};

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub id: i64,
    /// UTC
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: NaiveDateTime,
    /// Present with `tweet_mode=extended`
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub user: StatusUser,
    #[serde(default)]
    pub quoted_status: Option<Box<Status>>,
    #[serde(default)]
    pub entities: Option<Entities>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUser {
    pub screen_name: String,
    /// Seconds east of UTC; often missing
    #[serde(default)]
    pub utc_offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlEntity {
    pub url: String,
    #[serde(default)]
    pub expanded_url: Option<String>,
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_str(&raw, TWITTER_DATE_FORMAT)
        .map(|dt| dt.naive_utc())
        .map_err(serde::de::Error::custom)
}

impl Status {
    fn body(&self) -> TweetBody {
        let content = self
            .full_text
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or_default()
            .to_string();

        let embedded_url = self
            .entities
            .as_ref()
            .and_then(|e| e.urls.first())
            .map(|u| UrlCard {
                url: u.url.clone(),
                card_url: u.expanded_url.clone().unwrap_or_else(|| u.url.clone()),
                title: None,
                content: None,
            });

        TweetBody {
            tweet_id: self.id,
            author: self.user.screen_name.clone(),
            content,
            embedded_url,
            embedded_tweet: self.quoted_status.as_ref().map(|q| Box::new(q.body())),
        }
    }

    /// The local date is derived from the author's UTC offset, which Twitter
    /// does not always report, so it is not reliable.
    pub fn to_tweet(&self) -> TweetEnvelope {
        let offset = self.user.utc_offset.unwrap_or(0);
        TweetEnvelope {
            utc_date: self.created_at,
            local_date: self.created_at + Duration::seconds(offset),
            tweet: self.body(),
        }
    }
}
