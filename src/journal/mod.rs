//! Per-user download journals
//!
//! A journal is a directory holding one append-only file per user. Every
//! download is bracketed by a `Started` entry and a `Finished` or `Abandoned`
//! entry, which lets a crashed run resume and lets several processes share
//! the same set of users without fetching the same timeline twice.
//!
//! Files are kept per user so that no process holds a lock for long.

mod entry;
mod lock;
mod response;

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::consts::{JOURNAL_ACCESS_TIMEOUT_SECS, JOURNAL_FILE_EXT, TRANSACTION_EXPIRY_TIMEOUT_SECS};
use crate::utils::utc_now;

pub use entry::{EntryParseError, JournalEntry, JournalEntryType};
use lock::FileLock;
pub use response::JournalResponse;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out waiting for lock on {}", path.display())]
    LockTimeout { path: PathBuf },

    #[error("Cannot create journal at {}: parent directory does not exist", path.display())]
    MissingParent { path: PathBuf },

    #[error("Journal path {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> JournalError + '_ {
    move |source| JournalError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JournalSettings {
    /// How long to keep retrying a busy journal file
    pub lock_timeout: Duration,
    /// Age after which an unfinished Started entry no longer blocks the user
    pub transaction_expiry: Duration,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(JOURNAL_ACCESS_TIMEOUT_SECS),
            transaction_expiry: Duration::from_secs(TRANSACTION_EXPIRY_TIMEOUT_SECS),
        }
    }
}

/// Where a user stands, as read from the journal without writing to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    /// No entries yet
    New,
    /// Unexpired Started entry
    InUse,
    /// Last download completed
    Finished,
    /// Last download was abandoned or its Started entry expired
    Abandoned,
    /// Unparsable journal
    Broken,
}

impl UserState {
    pub fn as_str(self) -> &'static str {
        match self {
            UserState::New => "new",
            UserState::InUse => "in-use",
            UserState::Finished => "finished",
            UserState::Abandoned => "abandoned",
            UserState::Broken => "broken",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserStatus {
    pub user: String,
    pub state: UserState,
    /// Id to resume from, from the last Finished entry
    pub max_id: Option<i64>,
    pub last_tweet_date: Option<NaiveDateTime>,
    /// Date of the most recent entry of any kind
    pub last_access: Option<NaiveDateTime>,
}

/// Result of walking a user's condensed entries from newest to oldest
enum Resolution<'a> {
    InUse(&'a JournalEntry),
    Found(&'a JournalEntry, i64),
    NotFound,
}

pub struct Journal {
    dir: PathBuf,
    settings: JournalSettings,
}

impl Journal {
    /// Open the journal directory, creating it (but not its parents) if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, JournalError> {
        Self::with_settings(dir, JournalSettings::default())
    }

    pub fn with_settings(dir: impl Into<PathBuf>, settings: JournalSettings) -> Result<Self, JournalError> {
        let dir = dir.into();
        if dir.exists() {
            if !dir.is_dir() {
                return Err(JournalError::NotADirectory { path: dir });
            }
        } else {
            let parent_missing = dir
                .parent()
                .is_some_and(|p| !p.as_os_str().is_empty() && !p.exists());
            if parent_missing {
                return Err(JournalError::MissingParent { path: dir });
            }
            fs::create_dir(&dir).map_err(io_error(&dir))?;
        }
        Ok(Self { dir, settings })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record that the download started from `old_max_id` had to be given up
    pub fn abandon(&self, user_name: &str, old_max_id: Option<i64>) -> Result<(), JournalError> {
        let entry = JournalEntry::abandoned(utc_now(), user_name, old_max_id);
        self.append(user_name, &entry)
    }

    /// Record that tweets older than `old_max_id` were fetched, the oldest of
    /// them being `new_max_id` from `new_max_date`
    pub fn finish(
        &self,
        user_name: &str,
        old_max_id: Option<i64>,
        new_max_id: i64,
        new_max_date: Option<NaiveDateTime>,
    ) -> Result<(), JournalError> {
        let entry = JournalEntry::finished(utc_now(), user_name, old_max_id, new_max_id, new_max_date);
        self.append(user_name, &entry)
    }

    /// Claim a user for processing.
    ///
    /// With `from_max_id` the journal is not consulted: a Started entry is
    /// written for that id and `InUse` is returned. Otherwise the journal is
    /// replayed and a Started entry is written unless another process holds
    /// the user (`InUse`) or the file is unreadable (`BrokenJournal`).
    pub fn try_start(
        &self,
        user_name: &str,
        from_max_id: Option<i64>,
    ) -> Result<JournalResponse, JournalError> {
        let path = self.journal_for_user(user_name)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(io_error(&path))?;
        let _lock = FileLock::acquire(&file, &path, self.settings.lock_timeout)?;
        let now = utc_now();

        if let Some(max_id) = from_max_id {
            let entry = JournalEntry::started(now, user_name, Some(max_id));
            write_entry(&file, &path, &entry)?;
            return Ok(JournalResponse::in_use(&entry));
        }

        let entries = match read_entries(&file, user_name) {
            Ok(entries) => entries,
            Err(reason) => {
                return Ok(JournalResponse::BrokenJournal {
                    user: user_name.to_string(),
                    reason,
                });
            }
        };
        let entries = condense(entries);

        match self.resolve(&entries, now) {
            Resolution::InUse(entry) => Ok(JournalResponse::in_use(entry)),
            Resolution::Found(entry, max_id) => {
                let response = JournalResponse::found(entry, max_id);
                write_entry(&file, &path, &JournalEntry::started(now, user_name, Some(max_id)))?;
                Ok(response)
            }
            Resolution::NotFound => {
                write_entry(&file, &path, &JournalEntry::started(now, user_name, None))?;
                Ok(JournalResponse::NotFound {
                    user: user_name.to_string(),
                })
            }
        }
    }

    /// Read-only summary of a user's journal
    pub fn status(&self, user_name: &str) -> Result<UserStatus, JournalError> {
        let path = self.journal_for_user(user_name)?;
        let file = File::open(&path).map_err(io_error(&path))?;
        let _lock = FileLock::acquire(&file, &path, self.settings.lock_timeout)?;
        let now = utc_now();

        let entries = match read_entries(&file, user_name) {
            Ok(entries) => condense(entries),
            Err(_) => {
                return Ok(UserStatus {
                    user: user_name.to_string(),
                    state: UserState::Broken,
                    max_id: None,
                    last_tweet_date: None,
                    last_access: None,
                });
            }
        };

        let Some(last) = entries.last() else {
            return Ok(UserStatus {
                user: user_name.to_string(),
                state: UserState::New,
                max_id: None,
                last_tweet_date: None,
                last_access: None,
            });
        };

        let state = match last.entry_type {
            JournalEntryType::Started if !last.is_expired(now, self.settings.transaction_expiry) => {
                UserState::InUse
            }
            JournalEntryType::Finished => UserState::Finished,
            JournalEntryType::Started | JournalEntryType::Abandoned => UserState::Abandoned,
        };
        let (max_id, last_tweet_date) = match self.resolve(&entries, now) {
            Resolution::Found(entry, max_id) => (Some(max_id), entry.new_max_date),
            Resolution::InUse(entry) => (entry.old_max_id, None),
            Resolution::NotFound => (None, None),
        };

        Ok(UserStatus {
            user: last.user_name.clone(),
            state,
            max_id,
            last_tweet_date,
            last_access: Some(last.date),
        })
    }

    /// Users with a journal file, sorted
    pub fn journalled_users(&self) -> Result<Vec<String>, JournalError> {
        let entries = fs::read_dir(&self.dir).map_err(io_error(&self.dir))?;
        let mut users: Vec<String> = entries
            .flatten()
            .filter_map(|e| user_for_journal(&e.path()))
            .collect();
        users.sort();
        Ok(users)
    }

    fn resolve<'a>(&self, entries: &'a [JournalEntry], now: NaiveDateTime) -> Resolution<'a> {
        for entry in entries.iter().rev() {
            match entry.entry_type {
                JournalEntryType::Started => {
                    if !entry.is_expired(now, self.settings.transaction_expiry) {
                        return Resolution::InUse(entry);
                    }
                }
                JournalEntryType::Finished => {
                    if let Some(max_id) = entry.new_max_id {
                        return Resolution::Found(entry, max_id);
                    }
                }
                JournalEntryType::Abandoned => {}
            }
        }
        Resolution::NotFound
    }

    fn append(&self, user_name: &str, entry: &JournalEntry) -> Result<(), JournalError> {
        let path = self.journal_for_user(user_name)?;
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(io_error(&path))?;
        let _lock = FileLock::acquire(&file, &path, self.settings.lock_timeout)?;
        write_entry(&file, &path, entry)
    }

    /// Path of the user's journal file, created empty if missing
    fn journal_for_user(&self, user_name: &str) -> Result<PathBuf, JournalError> {
        let path = self
            .dir
            .join(format!("{}{}", user_name.to_lowercase(), JOURNAL_FILE_EXT));
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error(&path))?;
        Ok(path)
    }
}

/// Screen name for a journal file, or None if the path isn't one
fn user_for_journal(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    let user = name.strip_suffix(JOURNAL_FILE_EXT)?;
    if user.is_empty() {
        return None;
    }
    Some(user.to_string())
}

fn read_entries(file: &File, user_name: &str) -> Result<Vec<JournalEntry>, String> {
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("line {}: {}", line_no + 1, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: JournalEntry = line
            .parse()
            .map_err(|e| format!("line {}: {}", line_no + 1, e))?;
        if !entry.is_for_user(user_name) {
            return Err(format!(
                "line {}: entry for {} in journal of {}",
                line_no + 1,
                entry.user_name,
                user_name
            ));
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Replace each Started entry that was later completed by its completion
fn condense(entries: Vec<JournalEntry>) -> Vec<JournalEntry> {
    let mut condensed: Vec<JournalEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if condensed
            .last()
            .is_some_and(|last| last.is_completion_of(&entry))
        {
            condensed.pop();
        }
        condensed.push(entry);
    }
    condensed
}

fn write_entry(mut file: &File, path: &Path, entry: &JournalEntry) -> Result<(), JournalError> {
    file.seek(SeekFrom::End(0)).map_err(io_error(path))?;
    file.write_all(format!("{entry}\n").as_bytes())
        .map_err(io_error(path))?;
    file.flush().map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{format_timestamp, parse_timestamp};

    const BASE_ID: i64 = 7594930202;

    fn journal(dir: &Path) -> Journal {
        Journal::with_settings(
            dir.join("journal"),
            JournalSettings {
                lock_timeout: Duration::from_secs(2),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn date(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn new_creates_directory_but_not_parents() {
        let dir = tempfile::tempdir().unwrap();
        let j = Journal::new(dir.path().join("j")).unwrap();
        assert!(j.dir().is_dir());
        assert!(Journal::new(dir.path().join("j")).is_ok());

        let err = Journal::new(dir.path().join("missing").join("j")).err().unwrap();
        assert!(matches!(err, JournalError::MissingParent { .. }));
    }

    #[test]
    fn new_rejects_a_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "").unwrap();
        assert!(matches!(
            Journal::new(&file).err().unwrap(),
            JournalError::NotADirectory { .. }
        ));
    }

    #[test]
    fn two_journals_sharing_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let journal_1 = journal(dir.path());
        let journal_2 = journal(dir.path());
        let mut ids: Vec<i64> = (0..=6).map(|i| BASE_ID - 6 + i).collect();

        let r0 = journal_1.try_start("bob", None).unwrap();
        assert_eq!(r0, JournalResponse::NotFound { user: "bob".to_string() });

        let bob_id = ids.pop().unwrap();
        let r1 = journal_1.try_start("bob", Some(bob_id)).unwrap();
        assert!(matches!(r1, JournalResponse::InUse { max_id: Some(id), .. } if id == bob_id));

        let r2 = journal_2.try_start("bob", None).unwrap();
        assert_eq!(r2.max_id(), Some(bob_id));
        assert!(matches!(r2, JournalResponse::InUse { .. }));

        let r3 = journal_2.try_start("alice", None).unwrap();
        assert!(matches!(r3, JournalResponse::NotFound { .. }));
        let alice_id = ids.pop().unwrap();
        let r4 = journal_2.try_start("alice", Some(alice_id)).unwrap();
        assert_eq!(r4.max_id(), Some(alice_id));

        // User names are case-insensitive
        let r5 = journal_1.try_start("Bob", None).unwrap();
        assert!(matches!(r5, JournalResponse::InUse { .. }));
        assert_eq!(r5.max_id(), Some(bob_id));

        let r6 = journal_1.try_start("eve", None).unwrap();
        assert!(matches!(r6, JournalResponse::NotFound { .. }));

        let bob_new = ids.pop().unwrap();
        journal_1
            .finish("bob", r1.max_id(), bob_new, Some(date("2016-07-10T00:00:00")))
            .unwrap();
        let alice_new = ids.pop().unwrap();
        journal_2
            .finish("alice", r4.max_id(), alice_new, Some(date("2016-07-09T00:00:00")))
            .unwrap();
        journal_1.abandon("eve", None).unwrap();

        let r7 = journal_2.try_start("Alice", None).unwrap();
        match &r7 {
            JournalResponse::Found {
                max_id,
                last_tweet_date,
                ..
            } => {
                assert_eq!(*max_id, alice_new);
                assert_eq!(*last_tweet_date, Some(date("2016-07-09T00:00:00")));
            }
            other => panic!("expected Found, got {other}"),
        }
        // Now claimed by the Started entry try_start wrote
        assert!(matches!(
            journal_1.try_start("alice", None).unwrap(),
            JournalResponse::InUse { .. }
        ));

        let r8 = journal_2.try_start("bob", None).unwrap();
        assert_eq!(r8.max_id(), Some(bob_new));
        assert!(matches!(r8, JournalResponse::Found { .. }));

        // eve was abandoned from her very first start: nothing to resume from
        let r9 = journal_2.try_start("eve", None).unwrap();
        assert!(matches!(r9, JournalResponse::NotFound { .. }));

        assert_eq!(
            journal_1.journalled_users().unwrap(),
            vec!["alice".to_string(), "bob".to_string(), "eve".to_string()]
        );
    }

    #[test]
    fn expired_start_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let j = journal(dir.path());
        let old = format_timestamp(&date("2016-01-01T00:00:00"));
        let content = format!(
            "{old}\tbob\tFinished\tNone\t500\t2015-12-31T00:00:00\n\
             {old}\tbob\tStarted\t500\tNone\tNone\n"
        );
        fs::write(j.dir().join("bob.journal"), content).unwrap();

        let response = j.try_start("bob", None).unwrap();
        assert!(matches!(response, JournalResponse::Found { max_id: 500, .. }));
    }

    #[test]
    fn wrong_user_line_is_a_broken_journal_and_nothing_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let j = journal(dir.path());
        let path = j.dir().join("bob.journal");
        let content = "2016-01-01T00:00:00\tmallory\tFinished\tNone\t500\tNone\n";
        fs::write(&path, content).unwrap();

        let response = j.try_start("bob", None).unwrap();
        assert!(matches!(response, JournalResponse::BrokenJournal { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
        assert_eq!(j.status("bob").unwrap().state, UserState::Broken);
    }

    #[test]
    fn status_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let j = journal(dir.path());
        j.finish("Carol", None, 42, Some(date("2016-06-01T12:00:00")))
            .unwrap();
        let path = j.dir().join("carol.journal");
        let before = fs::read_to_string(&path).unwrap();

        let status = j.status("carol").unwrap();
        assert_eq!(status.user, "Carol");
        assert_eq!(status.state, UserState::Finished);
        assert_eq!(status.max_id, Some(42));
        assert_eq!(status.last_tweet_date, Some(date("2016-06-01T12:00:00")));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);

        j.try_start("carol", None).unwrap();
        assert_eq!(j.status("carol").unwrap().state, UserState::InUse);
        j.abandon("carol", Some(42)).unwrap();
        let status = j.status("carol").unwrap();
        assert_eq!(status.state, UserState::Abandoned);
        assert_eq!(status.max_id, Some(42));
    }

    #[test]
    fn journalled_users_ignores_hidden_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let j = journal(dir.path());
        fs::write(j.dir().join("dave.journal"), "").unwrap();
        fs::write(j.dir().join(".swap.journal"), "").unwrap();
        fs::write(j.dir().join("notes.txt"), "").unwrap();
        fs::create_dir(j.dir().join("sub.journal")).unwrap();
        assert_eq!(j.journalled_users().unwrap(), vec!["dave".to_string()]);
    }

    #[test]
    fn condense_collapses_completed_pairs() {
        let now = date("2016-07-01T00:00:00");
        let entries = vec![
            JournalEntry::started(now, "bob", None),
            JournalEntry::finished(now, "bob", None, 10, None),
            JournalEntry::started(now, "bob", Some(10)),
            JournalEntry::abandoned(now, "bob", Some(10)),
            JournalEntry::started(now, "bob", Some(10)),
        ];
        let condensed = condense(entries);
        let kinds: Vec<JournalEntryType> = condensed.iter().map(|e| e.entry_type).collect();
        assert_eq!(
            kinds,
            vec![
                JournalEntryType::Finished,
                JournalEntryType::Abandoned,
                JournalEntryType::Started
            ]
        );
    }
}
