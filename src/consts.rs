/// Standard date format used throughout the codebase: "2016-07-01"
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// ISO-8601 timestamp without offset; fractional seconds only when non-zero
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// `created_at` format used by the Twitter REST API: "Wed Aug 27 13:08:45 +0000 2008"
pub(crate) const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Placeholder written for absent journal fields
pub(crate) const NONE_FIELD: &str = "None";

pub(crate) const JOURNAL_FILE_EXT: &str = ".journal";

/// Tweet files written by the downloader use this extension
pub(crate) const TWEET_FILE_EXT: &str = "txt";

/// How long to keep retrying a journal lock (reading and parsing an entire journal)
pub(crate) const JOURNAL_ACCESS_TIMEOUT_SECS: u64 = 3 * 60;

/// A Started entry older than this is treated as abandoned
pub(crate) const TRANSACTION_EXPIRY_TIMEOUT_SECS: u64 = 5 * 60;

/// Twitter rate-limit windows are 15 minutes long
pub(crate) const RATE_LIMIT_WAIT_SECS: u64 = 15 * 60;

/// Largest page the user_timeline endpoint will return
pub(crate) const TIMELINE_PAGE_SIZE: u32 = 200;

/// Subdirectory of the tweets directory that downloaded tweets are appended to
pub(crate) const DOWNLOAD_CATEGORY: &str = "extended";

// Fixed invocation used by twextender-launch
pub const LAUNCH_INTERPRETER: &str = "python3.4";
pub const LAUNCH_PROGRAM: &str = "main.py";
pub const LAUNCH_TARGET_DATE: &str = "2016-07-01";
pub const LAUNCH_JOURNAL_DIR: &str = "/Users/bryanfeeney/opt-hillary/twextender.journal";
pub const LAUNCH_TWEETS_DIR: &str =
    "/Users/bryanfeeney/opt-hillary/twitter-tools-spider/src/test/resources/spider/_historic";
