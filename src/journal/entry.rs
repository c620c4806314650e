//! Journal entries: one tab-separated line per event
//!
//! `<date> <user> <Type> <old-max-id> <new-max-id> <new-max-date>`, with
//! absent values written as `None`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::consts::NONE_FIELD;
use crate::utils::{format_timestamp, parse_timestamp};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryParseError {
    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("invalid date \"{0}\"")]
    InvalidDate(String),

    #[error("unknown entry type \"{0}\"")]
    InvalidType(String),

    #[error("invalid tweet id \"{0}\"")]
    InvalidId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalEntryType {
    Started,
    Abandoned,
    Finished,
}

impl JournalEntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            JournalEntryType::Started => "Started",
            JournalEntryType::Abandoned => "Abandoned",
            JournalEntryType::Finished => "Finished",
        }
    }
}

impl FromStr for JournalEntryType {
    type Err = EntryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Started" => Ok(JournalEntryType::Started),
            "Abandoned" => Ok(JournalEntryType::Abandoned),
            "Finished" => Ok(JournalEntryType::Finished),
            other => Err(EntryParseError::InvalidType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// When the entry was written (UTC)
    pub date: NaiveDateTime,
    pub user_name: String,
    pub entry_type: JournalEntryType,
    /// Tweets older than this id were being requested
    pub old_max_id: Option<i64>,
    /// Smallest id of the batch that was downloaded
    pub new_max_id: Option<i64>,
    /// UTC date of the tweet with `new_max_id`
    pub new_max_date: Option<NaiveDateTime>,
}

impl JournalEntry {
    pub fn started(now: NaiveDateTime, user_name: &str, from_max_id: Option<i64>) -> Self {
        Self {
            date: now,
            user_name: user_name.to_string(),
            entry_type: JournalEntryType::Started,
            old_max_id: from_max_id,
            new_max_id: None,
            new_max_date: None,
        }
    }

    pub fn finished(
        now: NaiveDateTime,
        user_name: &str,
        old_max_id: Option<i64>,
        new_max_id: i64,
        new_max_date: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            date: now,
            user_name: user_name.to_string(),
            entry_type: JournalEntryType::Finished,
            old_max_id,
            new_max_id: Some(new_max_id),
            new_max_date,
        }
    }

    pub fn abandoned(now: NaiveDateTime, user_name: &str, old_max_id: Option<i64>) -> Self {
        Self {
            date: now,
            user_name: user_name.to_string(),
            entry_type: JournalEntryType::Abandoned,
            old_max_id,
            new_max_id: None,
            new_max_date: None,
        }
    }

    /// Case-insensitive check of the user this entry belongs to
    pub fn is_for_user(&self, user_name: &str) -> bool {
        self.user_name.eq_ignore_ascii_case(user_name)
    }

    /// True if `entry` (a Finished or Abandoned) closes the download this
    /// Started entry opened. The max ids must line up unless this one had none.
    pub fn is_completion_of(&self, entry: &JournalEntry) -> bool {
        if self.entry_type != JournalEntryType::Started {
            return false;
        }
        if entry.entry_type == JournalEntryType::Started {
            return false;
        }
        self.is_for_user(&entry.user_name)
            && (self.old_max_id.is_none() || self.old_max_id == entry.old_max_id)
    }

    pub fn is_expired(&self, now: NaiveDateTime, expiry: Duration) -> bool {
        let age_ms = now.signed_duration_since(self.date).num_milliseconds();
        age_ms > expiry.as_millis() as i64
    }
}

fn optional<T>(value: Option<&str>, parse: impl Fn(&str) -> Result<T, EntryParseError>) -> Result<Option<T>, EntryParseError> {
    match value.map(str::trim) {
        None => Ok(None),
        Some(v) if v == NONE_FIELD || v.is_empty() => Ok(None),
        Some(v) => parse(v).map(Some),
    }
}

fn parse_id(s: &str) -> Result<i64, EntryParseError> {
    s.parse::<i64>()
        .map_err(|_| EntryParseError::InvalidId(s.to_string()))
}

fn parse_date(s: &str) -> Result<NaiveDateTime, EntryParseError> {
    parse_timestamp(s).ok_or_else(|| EntryParseError::InvalidDate(s.to_string()))
}

impl FromStr for JournalEntry {
    type Err = EntryParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.trim().split('\t');

        let date = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or(EntryParseError::MissingField("date"))?;
        let date = parse_date(date)?;
        let user_name = parts
            .next()
            .ok_or(EntryParseError::MissingField("user"))?
            .to_string();
        let entry_type = parts
            .next()
            .ok_or(EntryParseError::MissingField("type"))?
            .parse::<JournalEntryType>()?;

        let old_max_id = optional(parts.next(), parse_id)?;
        let new_max_id = optional(parts.next(), parse_id)?;
        let new_max_date = optional(parts.next(), parse_date)?;

        Ok(JournalEntry {
            date,
            user_name,
            entry_type,
            old_max_id,
            new_max_id,
            new_max_date,
        })
    }
}

fn write_optional<T: fmt::Display>(f: &mut fmt::Formatter<'_>, value: Option<T>) -> fmt::Result {
    match value {
        Some(v) => write!(f, "\t{v}"),
        None => write!(f, "\t{NONE_FIELD}"),
    }
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}",
            format_timestamp(&self.date),
            self.user_name,
            self.entry_type.as_str()
        )?;
        write_optional(f, self.old_max_id)?;
        write_optional(f, self.new_max_id)?;
        write_optional(f, self.new_max_date.as_ref().map(format_timestamp))
    }
}
