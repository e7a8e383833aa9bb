use std::path::Path;
use std::time::Duration;

/// How long `DatabaseLock::acquire` waits for a live holder by default.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether a process with `pid` exists.
pub fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        Path::new(&format!("/proc/{pid}")).exists()
    }

    #[cfg(not(unix))]
    {
        // Assume alive where /proc is unavailable.
        let _ = pid;
        true
    }
}

/// PID recorded in an existing lock file.
pub fn read_holder_pid(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}
