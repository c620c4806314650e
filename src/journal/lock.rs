//! Advisory exclusive locks on journal files
//!
//! Locks are taken with a non-blocking `flock` and retried with jitter until
//! the access timeout runs out, so competing processes back off instead of
//! queueing forever.

use std::fs::File;
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use super::JournalError;

/// Held exclusive lock; released when dropped
pub(crate) struct FileLock<'a> {
    file: &'a File,
}

impl<'a> FileLock<'a> {
    pub(crate) fn acquire(file: &'a File, path: &Path, timeout: Duration) -> Result<Self, JournalError> {
        let deadline = Instant::now() + timeout;
        loop {
            match try_lock_exclusive(file) {
                Ok(()) => return Ok(Self { file }),
                Err(err)
                    if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) =>
                {
                    if Instant::now() >= deadline {
                        return Err(JournalError::LockTimeout {
                            path: path.to_path_buf(),
                        });
                    }
                    thread::sleep(backoff());
                }
                Err(source) => {
                    return Err(JournalError::Io {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        let _ = unlock(self.file);
    }
}

/// 50-100ms
fn backoff() -> Duration {
    Duration::from_millis(50) + Duration::from_secs_f64(rand::random::<f64>() * 0.05)
}

#[cfg(unix)]
fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // Safety: the descriptor is owned by `file`, which outlives the call.
    let ret = unsafe { libc::flock(file.as_raw_fd(), operation) };
    if ret == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
    flock(file, libc::LOCK_EX | libc::LOCK_NB)
}

#[cfg(unix)]
fn unlock(file: &File) -> io::Result<()> {
    flock(file, libc::LOCK_UN)
}

// No flock outside unix; journals are then only safe for a single process.
#[cfg(not(unix))]
fn try_lock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn unlock(_file: &File) -> io::Result<()> {
    Ok(())
}
