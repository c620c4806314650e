//! Tweets as written by the spider
//!
//! Parsing and writing of the tab-separated tweet format, plus discovery of
//! tweet files and the per-user "oldest tweet" scan the journal is seeded from.

mod files;
mod model;

pub use files::{
    MinTweet, TweetFile, append_tweets, merge_user_minimums, min_ids_and_dates, min_tweet,
    min_tweet_for_user, read_tweets, tweet_files,
};
pub use model::{TweetBody, TweetEnvelope, TweetParseError, UrlCard};
