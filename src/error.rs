use std::path::PathBuf;

use thiserror::Error;

use crate::download::DownloadError;
use crate::journal::JournalError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid date \"{input}\" (expected YYYYMMDD or YYYY-MM-DD)")]
    InvalidDate { input: String },

    /// Option combination rejected before any work starts
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Journal(#[from] JournalError),

    #[error("{0}")]
    Download(#[from] DownloadError),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Process exit status for this error: usage problems exit 2, everything else 1
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::InvalidDate { .. } | AppError::Usage(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{name}: command not found")]
    InterpreterNotFound { name: String },

    #[error("Failed to run {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot determine launcher directory: {0}")]
    LaunchDir(std::io::Error),
}

impl LaunchError {
    /// Shell-compatible status for failures that happen before the child runs
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::InterpreterNotFound { .. } => 127,
            LaunchError::Spawn { .. } | LaunchError::LaunchDir(_) => 126,
        }
    }
}
