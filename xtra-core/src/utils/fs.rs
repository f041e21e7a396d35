//! Filesystem helpers shared across modules.
//!
//! These helpers attach operation + path context to IO errors and wrap the
//! removal primitives the download cleanup relies on.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Convert an IO error into an application error with operation + path context.
pub fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::io_path(op, path, source)
}

/// Ensure a directory exists, creating it (recursively) if needed.
pub async fn ensure_dir_all_with_op(op: &'static str, path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| io_error(op, path, e))
}

/// Ensure a directory exists, creating it (recursively) if needed.
pub async fn ensure_dir_all(path: &Path) -> Result<()> {
    ensure_dir_all_with_op("creating directory", path).await
}

/// Ensure a directory exists (synchronous variant) with a custom operation label.
pub fn ensure_dir_all_sync_with_op(op: &'static str, path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| io_error(op, path, e))
}

/// Retry policy for removing files another process still holds open.
#[derive(Debug, Clone, Copy)]
pub struct RemoveRetry {
    pub max_retries: u32,
    /// Base delay, doubled on every attempt.
    pub base_delay: Duration,
}

impl Default for RemoveRetry {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Whether the OS refused the operation because the file is in use.
pub fn is_file_locked_error(error: &std::io::Error) -> bool {
    // Windows: ERROR_SHARING_VIOLATION = 32, ERROR_LOCK_VIOLATION = 33
    // Unix: EBUSY = 16, ETXTBSY = 26
    if matches!(error.raw_os_error(), Some(32 | 33 | 16 | 26)) {
        return true;
    }
    let msg = error.to_string().to_lowercase();
    msg.contains("being used") || msg.contains("locked") || msg.contains("busy")
}

/// Outcome of a best-effort removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removed {
    Deleted,
    /// Nothing was there; treated as success.
    Missing,
}

/// Remove a file, retrying with exponential backoff while it is locked.
///
/// A missing file is not an error.
pub async fn remove_file_with_retry(path: &Path, retry: RemoveRetry) -> Result<Removed> {
    let mut attempt = 0;
    loop {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                if attempt > 0 {
                    debug!(path = %path.display(), attempt, "File deleted after retries");
                }
                return Ok(Removed::Deleted);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Removed::Missing),
            Err(e) if is_file_locked_error(&e) && attempt < retry.max_retries => {
                let delay = retry.base_delay * 2u32.pow(attempt);
                warn!(
                    path = %path.display(),
                    ?delay,
                    "File is locked, retrying (attempt {}/{})",
                    attempt + 1,
                    retry.max_retries
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(io_error("removing file", path, e)),
        }
    }
}

/// Remove an empty directory. A missing directory is not an error.
pub async fn remove_dir(path: &Path) -> Result<Removed> {
    match tokio::fs::remove_dir(path).await {
        Ok(()) => Ok(Removed::Deleted),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removed::Missing),
        Err(e) => Err(io_error("removing directory", path, e)),
    }
}

/// Count the entries of a directory, stopping early once `limit` is exceeded.
pub async fn count_entries(path: &Path, limit: usize) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(path)
        .await
        .map_err(|e| io_error("reading directory", path, e))?;
    let mut count = 0;
    while entries
        .next_entry()
        .await
        .map_err(|e| io_error("reading directory", path, e))?
        .is_some()
    {
        count += 1;
        if count > limit {
            break;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_error_detection() {
        assert!(is_file_locked_error(&std::io::Error::from_raw_os_error(16)));
        assert!(is_file_locked_error(&std::io::Error::other(
            "The process cannot access the file because it is being used by another process"
        )));
        assert!(!is_file_locked_error(&std::io::Error::from(
            ErrorKind::PermissionDenied
        )));
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_benign() {
        let dir = tempfile::tempdir().unwrap();
        let removed = remove_file_with_retry(&dir.path().join("nope.ts"), RemoveRetry::default())
            .await
            .unwrap();
        assert_eq!(removed, Removed::Missing);
    }

    #[tokio::test]
    async fn test_remove_file_and_count_entries() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        tokio::fs::write(&file, b"x").await.unwrap();
        tokio::fs::write(dir.path().join("b.ts"), b"x").await.unwrap();
        assert_eq!(count_entries(dir.path(), 10).await.unwrap(), 2);

        let removed = remove_file_with_retry(&file, RemoveRetry::default())
            .await
            .unwrap();
        assert_eq!(removed, Removed::Deleted);
        assert_eq!(count_entries(dir.path(), 10).await.unwrap(), 1);
        assert_eq!(count_entries(dir.path(), 0).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("vod");
        ensure_dir_all(&sub).await.unwrap();
        assert_eq!(remove_dir(&sub).await.unwrap(), Removed::Deleted);
        assert_eq!(remove_dir(&sub).await.unwrap(), Removed::Missing);
    }
}
