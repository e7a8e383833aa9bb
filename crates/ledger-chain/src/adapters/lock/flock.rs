use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;

use super::liveness::{is_process_running, read_holder_pid, DEFAULT_LOCK_TIMEOUT};

/// Errors from data directory locking.
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock file could not be created.
    #[error("Failed to create lock file {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Another live process holds the lock.
    #[error("Ledger data directory {path} is in use{}", .pid.map(|p| format!(" by process {p}")).unwrap_or_default())]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },

    /// PID could not be written.
    #[error("Failed to write PID to lock file: {0}")]
    WriteFailed(#[source] io::Error),
}

/// Exclusive lock on a ledger data directory, released on drop.
#[derive(Debug)]
pub struct DatabaseLock {
    file: File,
    path: PathBuf,
    pid: u32,
}

impl DatabaseLock {
    const LOCK_FILE: &'static str = "LOCK";

    /// Acquire the lock, waiting up to the default timeout for a live holder.
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire_with_timeout(data_dir, DEFAULT_LOCK_TIMEOUT)
    }

    /// Acquire the lock, retrying with backoff until `timeout` elapses.
    ///
    /// A lock whose recorded PID no longer exists is treated as stale and
    /// taken over immediately.
    pub fn acquire_with_timeout(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = data_dir.join(Self::LOCK_FILE);
        let deadline = Instant::now() + timeout;
        let mut retry_delay = Duration::from_millis(25);

        std::fs::create_dir_all(data_dir).map_err(|source| LockError::CreateFailed {
            path: lock_path.clone(),
            source,
        })?;

        loop {
            // No truncate: the holder's PID must stay readable until we own the lock.
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&lock_path)
                .map_err(|source| LockError::CreateFailed {
                    path: lock_path.clone(),
                    source,
                })?;

            if file.try_lock_exclusive().is_ok() {
                let pid = std::process::id();
                let mut file = file;
                file.set_len(0).map_err(LockError::WriteFailed)?;
                writeln!(file, "{pid}").map_err(LockError::WriteFailed)?;
                file.sync_all().map_err(LockError::WriteFailed)?;

                tracing::info!("[ledger] 🔒 Acquired {}", lock_path.display());
                return Ok(Self {
                    file,
                    path: lock_path,
                    pid,
                });
            }

            let holder = read_holder_pid(&lock_path);
            drop(file);

            if let Some(pid) = holder {
                if !is_process_running(pid) {
                    tracing::warn!("[ledger] Removing stale lock left by process {pid}");
                    let _ = std::fs::remove_file(&lock_path);
                    continue;
                }
            }

            if Instant::now() >= deadline {
                return Err(LockError::AlreadyLocked {
                    pid: holder,
                    path: lock_path,
                });
            }

            std::thread::sleep(retry_delay);
            retry_delay = (retry_delay * 2).min(Duration::from_millis(500));
        }
    }

    /// PID of this process.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        #[allow(clippy::incompatible_msrv)]
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}
