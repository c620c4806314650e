//! Tweet types and the tab-separated line codec used by the spider
//!
//! A line is an envelope (local date, UTC date) followed by a tweet body.
//! Bodies may carry a URL card and a quoted tweet, which is itself a body.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::utils::{format_timestamp, parse_timestamp};

const SOME: &str = "some";
const NONE: &str = "none";
const CARD_PRESENT: &str = "P";
const CARD_ABSENT: &str = "-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TweetParseError {
    #[error("missing field {index}")]
    MissingField { index: usize },

    #[error("invalid tweet id \"{value}\" at field {index}")]
    InvalidId { index: usize, value: String },

    #[error("invalid date \"{value}\" at field {index}")]
    InvalidDate { index: usize, value: String },
}

/// A URL referenced by a tweet, rendered by Twitter as a "card". Title and
/// content are only present if the card itself was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCard {
    pub url: String,
    pub card_url: String,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl UrlCard {
    /// Parse a card starting at `start`, returning it and the next field position
    pub(crate) fn from_fields(fields: &[&str], start: usize) -> Result<(Self, usize), TweetParseError> {
        let url = field(fields, start)?;
        let card_url = field(fields, start + 1)?;
        let present = field(fields, start + 2)?.trim().eq_ignore_ascii_case(CARD_PRESENT);

        if present {
            let card = UrlCard {
                url: url.to_string(),
                card_url: card_url.to_string(),
                title: Some(field(fields, start + 3)?.to_string()),
                content: Some(field(fields, start + 4)?.to_string()),
            };
            Ok((card, start + 5))
        } else {
            let card = UrlCard {
                url: url.to_string(),
                card_url: card_url.to_string(),
                title: None,
                content: None,
            };
            Ok((card, start + 3))
        }
    }

    fn write_fields(&self, out: &mut String) {
        push_field(out, &self.url);
        push_field(out, &self.card_url);
        match (&self.title, &self.content) {
            (Some(title), content) => {
                push_field(out, CARD_PRESENT);
                push_field(out, title);
                push_field(out, content.as_deref().unwrap_or(""));
            }
            (None, _) => push_field(out, CARD_ABSENT),
        }
    }
}

/// The bulk of a tweet: everything except the dates in its envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetBody {
    pub tweet_id: i64,
    /// Screen name of the person who wrote the tweet
    pub author: String,
    pub content: String,
    pub embedded_url: Option<UrlCard>,
    /// The tweet being commented on, for quote tweets
    pub embedded_tweet: Option<Box<TweetBody>>,
}

impl TweetBody {
    pub(crate) fn from_fields(fields: &[&str], start: usize) -> Result<(Self, usize), TweetParseError> {
        let author = field(fields, start)?;
        let raw_id = field(fields, start + 1)?;
        let tweet_id = raw_id
            .trim()
            .parse::<i64>()
            .map_err(|_| TweetParseError::InvalidId {
                index: start + 1,
                value: raw_id.to_string(),
            })?;
        let content = field(fields, start + 2)?;

        let (embedded_url, next) = if is_some(field(fields, start + 3)?) {
            let (card, next) = UrlCard::from_fields(fields, start + 4)?;
            (Some(card), next)
        } else {
            (None, start + 4)
        };

        let (embedded_tweet, next) = if is_some(field(fields, next)?) {
            let (body, next) = TweetBody::from_fields(fields, next + 1)?;
            (Some(Box::new(body)), next)
        } else {
            (None, next + 1)
        };

        let body = TweetBody {
            tweet_id,
            author: author.to_string(),
            content: content.to_string(),
            embedded_url,
            embedded_tweet,
        };
        Ok((body, next))
    }

    fn write_fields(&self, out: &mut String) {
        push_field(out, &self.author);
        push_field(out, &self.tweet_id.to_string());
        push_field(out, &self.content);
        match &self.embedded_url {
            Some(card) => {
                push_field(out, SOME);
                card.write_fields(out);
            }
            None => push_field(out, NONE),
        }
        match &self.embedded_tweet {
            Some(body) => {
                push_field(out, SOME);
                body.write_fields(out);
            }
            None => push_field(out, NONE),
        }
    }
}

/// Date information for a tweet plus the (possibly nested) tweet itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetEnvelope {
    pub utc_date: NaiveDateTime,
    /// Date in the account holder's zone; not reliable for downloaded tweets
    pub local_date: NaiveDateTime,
    pub tweet: TweetBody,
}

impl TweetEnvelope {
    pub fn parse_line(line: &str) -> Result<Self, TweetParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();

        let local_date = date_field(&fields, 0)?;
        let utc_date = date_field(&fields, 1)?;
        let (tweet, _) = TweetBody::from_fields(&fields, 2)?;

        Ok(TweetEnvelope {
            utc_date,
            local_date,
            tweet,
        })
    }

    /// Render as a single tab-separated line, without a trailing newline
    pub fn to_line(&self) -> String {
        let mut out = String::new();
        push_field(&mut out, &format_timestamp(&self.local_date));
        push_field(&mut out, &format_timestamp(&self.utc_date));
        self.tweet.write_fields(&mut out);
        out
    }
}

fn field<'a>(fields: &[&'a str], index: usize) -> Result<&'a str, TweetParseError> {
    fields
        .get(index)
        .copied()
        .ok_or(TweetParseError::MissingField { index })
}

fn date_field(fields: &[&str], index: usize) -> Result<NaiveDateTime, TweetParseError> {
    let raw = field(fields, index)?;
    parse_timestamp(raw).ok_or_else(|| TweetParseError::InvalidDate {
        index,
        value: raw.to_string(),
    })
}

fn is_some(flag: &str) -> bool {
    flag.trim().eq_ignore_ascii_case(SOME)
}

/// Append a field, keeping the record on one line
fn push_field(out: &mut String, value: &str) {
    if !out.is_empty() {
        out.push('\t');
    }
    for c in value.chars() {
        match c {
            '\t' | '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
}
