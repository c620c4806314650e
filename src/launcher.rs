//! Fixed-invocation launcher for the journal processor
//!
//! Runs `<interpreter> <program> -d <date> -p <journal> -t <tweets>` from the
//! launcher's own directory and hands back the child's exit status.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::config::LaunchConfig;
use crate::consts::{
    LAUNCH_INTERPRETER, LAUNCH_JOURNAL_DIR, LAUNCH_PROGRAM, LAUNCH_TARGET_DATE, LAUNCH_TWEETS_DIR,
};
use crate::error::LaunchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub interpreter: String,
    /// Relative paths resolve against the launcher's directory
    pub program: String,
    pub target_date: String,
    pub journal_dir: String,
    pub tweets_dir: String,
}

impl Default for LaunchPlan {
    fn default() -> Self {
        Self {
            interpreter: LAUNCH_INTERPRETER.to_string(),
            program: LAUNCH_PROGRAM.to_string(),
            target_date: LAUNCH_TARGET_DATE.to_string(),
            journal_dir: LAUNCH_JOURNAL_DIR.to_string(),
            tweets_dir: LAUNCH_TWEETS_DIR.to_string(),
        }
    }
}

impl LaunchPlan {
    /// Built-in invocation with any `[launch]` overrides applied
    pub fn from_config(config: &LaunchConfig) -> Self {
        let defaults = Self::default();
        Self {
            interpreter: config.interpreter.clone().unwrap_or(defaults.interpreter),
            program: config.program.clone().unwrap_or(defaults.program),
            target_date: config.target_date.clone().unwrap_or(defaults.target_date),
            journal_dir: config.journal_dir.clone().unwrap_or(defaults.journal_dir),
            tweets_dir: config.tweets_dir.clone().unwrap_or(defaults.tweets_dir),
        }
    }

    /// Arguments passed to the interpreter, program first
    pub fn args(&self) -> Vec<String> {
        vec![
            self.program.clone(),
            "-d".to_string(),
            self.target_date.clone(),
            "-p".to_string(),
            self.journal_dir.clone(),
            "-t".to_string(),
            self.tweets_dir.clone(),
        ]
    }
}

/// Locate the interpreter on PATH (or use it as given when it is a path)
pub fn resolve_interpreter(name: &str) -> Result<PathBuf, LaunchError> {
    which::which(name).map_err(|_| LaunchError::InterpreterNotFound {
        name: name.to_string(),
    })
}

/// Directory holding the running executable
pub fn launcher_dir() -> Result<PathBuf, LaunchError> {
    let exe = std::env::current_exe().map_err(LaunchError::LaunchDir)?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        LaunchError::LaunchDir(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "executable has no parent directory",
        ))
    })
}

/// Run the plan from `dir` and wait for it; returns the exit code to forward
pub fn run(plan: &LaunchPlan, dir: &Path) -> Result<i32, LaunchError> {
    let interpreter = resolve_interpreter(&plan.interpreter)?;
    let status = Command::new(&interpreter)
        .args(plan.args())
        .current_dir(dir)
        .status()
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LaunchError::InterpreterNotFound {
                    name: plan.interpreter.clone(),
                }
            } else {
                LaunchError::Spawn {
                    name: plan.interpreter.clone(),
                    source,
                }
            }
        })?;
    Ok(exit_code(status))
}

/// Shell convention: the child's code, or 128 + signal when it was killed
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
