use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use crate::cli::{Action, Cli};
use crate::config::Config;
use crate::consts::DOWNLOAD_CATEGORY;
use crate::download::{DownloadSettings, Keys, TweetSource, TwitterClient, tweets_for_user};
use crate::error::AppError;
use crate::journal::{Journal, JournalResponse, JournalSettings};
use crate::output::{output_status_json, print_status_table};
use crate::tweet::{
    append_tweets, merge_user_minimums, min_ids_and_dates, min_tweet_for_user, tweet_files,
};
use crate::utils::{debug_enabled, set_debug};

/// Tunables resolved from the config file
#[derive(Debug, Clone)]
pub struct Settings {
    pub journal: JournalSettings,
    pub download: DownloadSettings,
    /// Subdirectory of the tweets directory that downloads are appended to
    pub download_category: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            journal: JournalSettings::default(),
            download: DownloadSettings::default(),
            download_category: DOWNLOAD_CATEGORY.to_string(),
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config, quiet: bool) -> Self {
        let mut settings = Self::default();
        if let Some(secs) = config.lock_timeout_secs {
            settings.journal.lock_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = config.transaction_expiry_secs {
            settings.journal.transaction_expiry = Duration::from_secs(secs);
        }
        if let Some(secs) = config.rate_limit_wait_secs {
            settings.download.rate_limit_wait = Duration::from_secs(secs);
        }
        if let Some(size) = config.page_size.filter(|s| *s > 0) {
            settings.download.page_size = size;
        }
        if let Some(category) = config.download_category.as_ref().filter(|c| !c.is_empty()) {
            settings.download_category = category.clone();
        }
        settings.download.quiet = quiet;
        settings
    }
}

/// Counts reported at the end of a process run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    pub processed: usize,
    pub tweets: usize,
    /// Users already past the target date
    pub complete: usize,
    pub busy: usize,
    pub failed: usize,
}

impl fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} users processed, {} tweets downloaded, {} already complete, {} busy, {} failed",
            self.processed, self.tweets, self.complete, self.busy, self.failed
        )
    }
}

enum UserOutcome {
    Downloaded(usize),
    Complete,
    Busy,
    Failed,
}

pub fn run(cli: Cli, config: &Config) -> Result<(), AppError> {
    set_debug(cli.debug);
    let settings = Settings::from_config(config, cli.quiet);

    match cli.action()? {
        Action::Create { out, tweets_dir } => {
            let count = create_journal(&out, &tweets_dir, &settings)?;
            println!("{} user-records written to journal at {}", count, out.display());
        }
        Action::Process {
            journal,
            tweets_dir,
            target_date,
        } => {
            ensure_journal_dir(&journal)?;
            let keys_path = cli
                .keys
                .clone()
                .or_else(Keys::default_path)
                .unwrap_or_else(|| PathBuf::from("keys.json"));
            let keys = Keys::load(&keys_path)?;
            let client = TwitterClient::connect(&keys)?;
            let summary =
                process_journal(&journal, &tweets_dir, target_date, &client, &settings, cli.quiet)?;
            if !cli.quiet {
                eprintln!();
            }
            println!("{summary}");
        }
        Action::List { journal } => {
            list_journal(&journal, cli.json, cli.use_color(), &settings)?;
        }
    }
    Ok(())
}

/// Write one Finished record per user holding the oldest tweet found below
/// `tweets_dir`. Returns the number of users written.
pub fn create_journal(out: &Path, tweets_dir: &Path, settings: &Settings) -> Result<usize, AppError> {
    if !tweets_dir.is_dir() {
        return Err(AppError::Usage(format!(
            "Tweets directory {} does not exist",
            tweets_dir.display()
        )));
    }

    let files = tweet_files(tweets_dir);
    if debug_enabled() {
        eprintln!("[DEBUG] {} tweet files under {}", files.len(), tweets_dir.display());
    }
    let minimums = merge_user_minimums(&min_ids_and_dates(&files));

    let journal = Journal::with_settings(out, settings.journal)?;
    let mut users: Vec<_> = minimums.into_iter().collect();
    users.sort_by(|a, b| a.0.cmp(&b.0));
    for (user, (min_id, min_date)) in &users {
        journal.finish(user, None, *min_id, Some(*min_date))?;
    }
    Ok(users.len())
}

/// Extend every journalled user back to `target_date`, one user at a time.
///
/// Individual users that fail are abandoned and counted; only errors that
/// leave the journal itself unusable abort the run.
pub fn process_journal(
    journal_dir: &Path,
    tweets_dir: &Path,
    target_date: NaiveDate,
    source: &dyn TweetSource,
    settings: &Settings,
    quiet: bool,
) -> Result<ProcessSummary, AppError> {
    ensure_journal_dir(journal_dir)?;
    let journal = Journal::with_settings(journal_dir, settings.journal)?;
    let users = journal.journalled_users()?;
    let mut summary = ProcessSummary::default();

    for (i, user) in users.iter().enumerate() {
        if !quiet {
            eprint!("\r[{}/{}] {:<30}", i + 1, users.len(), user);
        }
        match process_user(&journal, user, tweets_dir, target_date, source, settings)? {
            UserOutcome::Downloaded(n) => {
                summary.processed += 1;
                summary.tweets += n;
            }
            UserOutcome::Complete => {
                summary.processed += 1;
                summary.complete += 1;
            }
            UserOutcome::Busy => summary.busy += 1,
            UserOutcome::Failed => summary.failed += 1,
        }
    }
    Ok(summary)
}

fn process_user(
    journal: &Journal,
    user: &str,
    tweets_dir: &Path,
    target_date: NaiveDate,
    source: &dyn TweetSource,
    settings: &Settings,
) -> Result<UserOutcome, AppError> {
    let min_date = target_date.and_hms_opt(0, 0, 0).unwrap_or_default();

    let (max_id, last_date) = match journal.try_start(user, None)? {
        JournalResponse::InUse { .. } => return Ok(UserOutcome::Busy),
        JournalResponse::BrokenJournal { reason, .. } => {
            eprintln!("\nWarning: skipping {user}: {reason}");
            return Ok(UserOutcome::Failed);
        }
        JournalResponse::NotFound { .. } => match min_tweet_for_user(tweets_dir, user) {
            Some((id, date)) => (Some(id), Some(date)),
            None => (None, None),
        },
        JournalResponse::Found {
            max_id,
            last_tweet_date,
            ..
        } => (Some(max_id), last_tweet_date),
    };

    if let (Some(max_id), Some(date)) = (max_id, last_date)
        && date < min_date
    {
        journal.finish(user, Some(max_id), max_id, Some(date))?;
        return Ok(UserOutcome::Complete);
    }

    let tweets = match tweets_for_user(source, user, max_id, min_date, &settings.download) {
        Ok(tweets) => tweets,
        Err(err) => {
            warn_user(user, "download", &err);
            journal.abandon(user, max_id)?;
            return Ok(UserOutcome::Failed);
        }
    };

    let Some(oldest) = tweets.iter().min_by_key(|t| t.tweet.tweet_id) else {
        match max_id {
            Some(id) => journal.finish(user, Some(id), id, last_date)?,
            None => journal.abandon(user, None)?,
        }
        return Ok(UserOutcome::Downloaded(0));
    };
    let (new_id, new_date) = (oldest.tweet.tweet_id, oldest.utc_date);

    if let Err(err) = append_tweets(tweets_dir, &settings.download_category, user, &tweets) {
        warn_user(user, "writing tweets", &err);
        journal.abandon(user, max_id)?;
        return Ok(UserOutcome::Failed);
    }
    if debug_enabled() {
        eprintln!("[DEBUG] {user}: {} tweets, oldest {new_id}", tweets.len());
    }
    journal.finish(user, max_id, new_id, Some(new_date))?;
    Ok(UserOutcome::Downloaded(tweets.len()))
}

fn warn_user(user: &str, stage: &str, err: &dyn fmt::Display) {
    eprintln!("\nWarning: {stage} for {user} failed: {err}");
}

fn ensure_journal_dir(journal_dir: &Path) -> Result<(), AppError> {
    if journal_dir.is_dir() {
        return Ok(());
    }
    Err(AppError::Usage(format!(
        "No journal found at {}",
        journal_dir.display()
    )))
}

pub fn list_journal(
    journal_dir: &Path,
    json: bool,
    use_color: bool,
    settings: &Settings,
) -> Result<(), AppError> {
    ensure_journal_dir(journal_dir)?;
    let journal = Journal::with_settings(journal_dir, settings.journal)?;
    let statuses = journal
        .journalled_users()?
        .iter()
        .map(|user| journal.status(user))
        .collect::<Result<Vec<_>, _>>()?;

    if json {
        println!("{}", output_status_json(&statuses));
    } else if statuses.is_empty() {
        println!("No users in journal {}.", journal_dir.display());
    } else {
        print_status_table(&journal_dir.display().to_string(), &statuses, use_color);
    }
    Ok(())
}
