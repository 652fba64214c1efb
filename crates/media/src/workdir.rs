//! Temp-workdir management: creation at startup and TTL cleanup on demand.

use std::{
    io,
    path::Path,
    time::{Duration, SystemTime},
};

use tracing::{info, warn};

/// Create the working directory if it does not exist yet.
pub fn ensure_workdir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Delete regular files in `dir` last modified more than `max_age` ago.
///
/// Per-file failures are logged and skipped; the sweep itself only fails
/// when the directory cannot be read at all. Returns the number of files
/// removed.
pub fn cleanup_old_files(dir: &Path, max_age: Duration) -> io::Result<usize> {
    let cutoff = SystemTime::now() - max_age;
    let mut removed = 0;

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "unreadable directory entry during cleanup");
                continue;
            },
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "no mtime, skipping");
                continue;
            },
        };

        if modified < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "removed stale file");
                    removed += 1;
                },
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale file"),
            }
        }
    }

    Ok(removed)
}
