//! Tweet file discovery and per-user minimum scan
//!
//! The spider lays tweets out as `<tweets_dir>/<category>/<user>.<ext>`, one
//! tweet per line. A user may appear under several categories.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rayon::prelude::*;

use crate::consts::TWEET_FILE_EXT;
use crate::utils::debug_enabled;

use super::model::TweetEnvelope;

/// Oldest tweet seen for a user: (tweet id, UTC date)
pub type MinTweet = (i64, NaiveDateTime);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetFile {
    pub path: PathBuf,
    /// Parent directory relative to the tweets directory; empty at the root
    pub category: String,
    pub user: String,
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Find every non-hidden regular file below `tweets_dir`
pub fn tweet_files(tweets_dir: &Path) -> Vec<TweetFile> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(&tweets_dir.to_string_lossy()));
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };

    let mut files = Vec::new();
    let Ok(entries) = glob::glob_with(&pattern, options) else {
        return files;
    };
    for path in entries.flatten() {
        if !path.is_file() || is_hidden(&path) {
            continue;
        }
        let Some(user) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let category = path
            .parent()
            .and_then(|p| p.strip_prefix(tweets_dir).ok())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push(TweetFile {
            user: user.to_string(),
            category,
            path,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Read every parsable tweet in a file. Unreadable lines are skipped.
pub fn read_tweets(path: &Path) -> Vec<TweetEnvelope> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(err) => {
            if debug_enabled() {
                eprintln!("Failed to open {}: {}", path.display(), err);
            }
            return Vec::new();
        }
    };
    let reader = BufReader::new(file);

    let mut tweets = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                if debug_enabled() {
                    eprintln!(
                        "Failed to read line {} in {}: {}",
                        line_no + 1,
                        path.display(),
                        err
                    );
                }
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match TweetEnvelope::parse_line(&line) {
            Ok(tweet) => tweets.push(tweet),
            Err(err) => {
                if debug_enabled() {
                    eprintln!("Invalid tweet at {}:{}: {}", path.display(), line_no + 1, err);
                }
            }
        }
    }
    tweets
}

/// The tweet with the smallest id in `tweets`
pub fn min_tweet<'a, I>(tweets: I) -> Option<MinTweet>
where
    I: IntoIterator<Item = &'a TweetEnvelope>,
{
    tweets
        .into_iter()
        .map(|t| (t.tweet.tweet_id, t.utc_date))
        .min_by_key(|(id, _)| *id)
}

fn keep_older(slot: &mut MinTweet, candidate: MinTweet) {
    if candidate.0 < slot.0 {
        *slot = candidate;
    }
}

/// For every category, the oldest tweet of every user, scanning files in parallel
pub fn min_ids_and_dates(files: &[TweetFile]) -> HashMap<String, HashMap<String, MinTweet>> {
    files
        .par_iter()
        .filter_map(|file| {
            let tweets = read_tweets(&file.path);
            min_tweet(&tweets).map(|min| (file.category.clone(), file.user.clone(), min))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .fold(HashMap::new(), |mut acc, (category, user, min)| {
            let users: &mut HashMap<String, MinTweet> = acc.entry(category).or_default();
            match users.get_mut(&user) {
                Some(existing) => keep_older(existing, min),
                None => {
                    users.insert(user, min);
                }
            }
            acc
        })
}

/// Collapse per-category minimums into one per user; the smallest id wins
pub fn merge_user_minimums(
    by_category: &HashMap<String, HashMap<String, MinTweet>>,
) -> HashMap<String, MinTweet> {
    let mut users: HashMap<String, MinTweet> = HashMap::new();
    for cat_map in by_category.values() {
        for (user, min) in cat_map {
            match users.get_mut(user) {
                Some(existing) => keep_older(existing, *min),
                None => {
                    users.insert(user.clone(), *min);
                }
            }
        }
    }
    users
}

/// Oldest tweet already held for `user` anywhere below `tweets_dir`
pub fn min_tweet_for_user(tweets_dir: &Path, user: &str) -> Option<MinTweet> {
    let files: Vec<TweetFile> = tweet_files(tweets_dir)
        .into_iter()
        .filter(|f| f.user.eq_ignore_ascii_case(user))
        .collect();
    merge_user_minimums(&min_ids_and_dates(&files))
        .into_values()
        .min_by_key(|(id, _)| *id)
}

/// Append tweets to `<tweets_dir>/<category>/<user>.txt`, creating it as needed
pub fn append_tweets(
    tweets_dir: &Path,
    category: &str,
    user: &str,
    tweets: &[TweetEnvelope],
) -> std::io::Result<PathBuf> {
    let dir = tweets_dir.join(category);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.{}", user.to_lowercase(), TWEET_FILE_EXT));

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut buf = String::new();
    for tweet in tweets {
        buf.push_str(&tweet.to_line());
        buf.push('\n');
    }
    file.write_all(buf.as_bytes())?;
    file.flush()?;
    Ok(path)
}
