//! CLI argument definitions
//!
//! Option parsing, configuration merging and the sanity checks that decide
//! which action a run performs.

use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::config::Config;
use crate::error::AppError;
use crate::utils::parse_date;

#[derive(Parser, Debug)]
#[command(name = "twextender")]
#[command(
    about = "Extend spidered Twitter user archives back to a target date",
    long_about = "Extend spidered Twitter user archives back to a target date.\n\n\
        With --create-journal, scan a directory of downloaded tweets and write a journal \
        recording, for every user, the oldest tweet downloaded so far.\n\n\
        With --process-journal, resume downloading every journalled user's tweets until \
        the --target-date threshold has been passed.",
    version
)]
pub struct Cli {
    /// Create a journal saved at the given OUT path
    #[arg(short = 'c', long = "create-journal", value_name = "OUT")]
    pub create_journal: Option<PathBuf>,

    /// Open the given INPUT journal and start downloading tweets
    #[arg(short = 'p', long = "process-journal", value_name = "INPUT")]
    pub process_journal: Option<PathBuf>,

    /// Show the state of every user in the given INPUT journal
    #[arg(short = 'l', long = "list-journal", value_name = "INPUT")]
    pub list_journal: Option<PathBuf>,

    /// When downloading tweets, stop once this threshold has been passed (going back)
    #[arg(short = 'd', long = "target-date", value_name = "DATE")]
    pub target_date: Option<String>,

    /// The directory where tweets are read from, or written to
    #[arg(short = 't', long = "tweets-dir", value_name = "TDIR")]
    pub tweets_dir: Option<PathBuf>,

    /// JSON file with the Twitter consumer keys
    #[arg(short = 'k', long = "keys", value_name = "FILE")]
    pub keys: Option<PathBuf>,

    /// Output the journal listing as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Suppress progress messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug output (report unparsable lines and other details)
    #[arg(long)]
    pub debug: bool,
}

/// What a validated command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create {
        out: PathBuf,
        tweets_dir: PathBuf,
    },
    Process {
        journal: PathBuf,
        tweets_dir: PathBuf,
        target_date: NaiveDate,
    },
    List {
        journal: PathBuf,
    },
}

fn usage(msg: &str) -> AppError {
    AppError::Usage(msg.to_string())
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub fn with_config(mut self, config: &Config) -> Self {
        // For boolean flags, config only applies if CLI is false (default)
        if !self.quiet && config.quiet {
            self.quiet = true;
        }
        if !self.debug && config.debug {
            self.debug = true;
        }
        if self.keys.is_none() {
            self.keys = config.keys_file.clone();
        }
        self
    }

    pub fn use_color(&self) -> bool {
        std::io::stdout().is_terminal()
    }

    /// Check the option combination and pick the action to run
    pub fn action(&self) -> Result<Action, AppError> {
        let creating = self.create_journal.as_ref();
        let processing = self.process_journal.as_ref();

        if (creating.is_some() || processing.is_some()) && self.tweets_dir.is_none() {
            return Err(usage("You must supply a path to a tweets directory"));
        }

        if let Some(out) = creating {
            if processing.is_some() {
                return Err(usage(
                    "Cannot create and process a journal at the same time, separate invocations must be used for each action",
                ));
            }
            if out.exists() {
                return Err(usage(
                    "A file at the given journal path already exists. Refusing to overwrite",
                ));
            }
            if self.target_date.is_some() {
                return Err(usage("Target date is not to be used when creating a journal"));
            }
            if self.list_journal.is_some() {
                return Err(usage("Cannot list a journal while creating or processing one"));
            }
            return Ok(Action::Create {
                out: out.clone(),
                tweets_dir: self.tweets_dir.clone().unwrap_or_default(),
            });
        }

        if let Some(journal) = processing {
            let Some(raw_date) = self.target_date.as_deref() else {
                return Err(usage("A target date must be specified when processing a journal"));
            };
            let target_date = parse_date(raw_date)?;
            if self.list_journal.is_some() {
                return Err(usage("Cannot list a journal while creating or processing one"));
            }
            return Ok(Action::Process {
                journal: journal.clone(),
                tweets_dir: self.tweets_dir.clone().unwrap_or_default(),
                target_date,
            });
        }

        if let Some(journal) = self.list_journal.as_ref() {
            return Ok(Action::List {
                journal: journal.clone(),
            });
        }

        Err(usage(
            "Need to specify either a --create-journal, --process-journal or --list-journal action",
        ))
    }
}
