use std::fmt;

use chrono::NaiveDateTime;

use crate::utils::format_timestamp;

use super::entry::JournalEntry;

/// Outcome of asking the journal whether a user can be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalResponse {
    /// First time this user is seen; the caller must find a max id elsewhere
    NotFound { user: String },
    /// Resume from `max_id`; a Started entry has been written for it
    Found {
        user: String,
        max_id: i64,
        last_access: NaiveDateTime,
        last_tweet_date: Option<NaiveDateTime>,
    },
    /// Another process holds an unexpired Started entry for this user
    InUse {
        user: String,
        max_id: Option<i64>,
        last_access: NaiveDateTime,
    },
    /// The journal file could not be interpreted
    BrokenJournal { user: String, reason: String },
}

impl JournalResponse {
    pub(crate) fn found(entry: &JournalEntry, max_id: i64) -> Self {
        JournalResponse::Found {
            user: entry.user_name.clone(),
            max_id,
            last_access: entry.date,
            last_tweet_date: entry.new_max_date,
        }
    }

    pub(crate) fn in_use(entry: &JournalEntry) -> Self {
        JournalResponse::InUse {
            user: entry.user_name.clone(),
            max_id: entry.old_max_id,
            last_access: entry.date,
        }
    }

    pub fn user(&self) -> &str {
        match self {
            JournalResponse::NotFound { user }
            | JournalResponse::Found { user, .. }
            | JournalResponse::InUse { user, .. }
            | JournalResponse::BrokenJournal { user, .. } => user,
        }
    }

    pub fn max_id(&self) -> Option<i64> {
        match self {
            JournalResponse::Found { max_id, .. } => Some(*max_id),
            JournalResponse::InUse { max_id, .. } => *max_id,
            JournalResponse::NotFound { .. } | JournalResponse::BrokenJournal { .. } => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            JournalResponse::NotFound { .. } => "NotFound",
            JournalResponse::Found { .. } => "Found",
            JournalResponse::InUse { .. } => "InUse",
            JournalResponse::BrokenJournal { .. } => "BrokenJournal",
        }
    }
}

impl fmt::Display for JournalResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}]", self.kind(), self.user())?;
        match self {
            JournalResponse::Found {
                max_id,
                last_access,
                ..
            } => write!(f, " {}@{}", max_id, format_timestamp(last_access)),
            JournalResponse::InUse {
                max_id,
                last_access,
                ..
            } => match max_id {
                Some(id) => write!(f, " {}@{}", id, format_timestamp(last_access)),
                None => write!(f, " None@{}", format_timestamp(last_access)),
            },
            JournalResponse::BrokenJournal { reason, .. } => write!(f, " {reason}"),
            JournalResponse::NotFound { .. } => Ok(()),
        }
    }
}
