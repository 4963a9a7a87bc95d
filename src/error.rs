use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Failures that abort a whole scan. No partial result is produced.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("directory not found: '{}'", .0.display())]
    RootNotFound(PathBuf),

    #[error("not a directory: '{}'", .0.display())]
    NotADirectory(PathBuf),

    #[error("directory not accessible: '{}': {source}", .path.display())]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scan cancelled")]
    Cancelled,

    #[error("failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A recoverable failure tied to a single path.
///
/// The offending path is skipped and the scan carries on with the rest of
/// the tree; these are collected and handed back next to the duplicate groups.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}: {reason}", .path.display())]
pub struct FileError {
    #[serde(serialize_with = "crate::duplicates::serialize_path_lossy")]
    pub path: PathBuf,
    #[serde(skip)]
    pub kind: io::ErrorKind,
    pub reason: String,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, kind: io::ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }

    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        Self::new(path, err.kind(), err.to_string())
    }

    /// Walk errors may come without a path (e.g. loop detection); fall back
    /// to the directory being listed when that happens.
    pub fn from_walk(fallback: &Path, err: walkdir::Error) -> Self {
        let path = err.path().unwrap_or(fallback).to_path_buf();
        let kind = err
            .io_error()
            .map(|e| e.kind())
            .unwrap_or(io::ErrorKind::Other);
        Self::new(path, kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_error_display_names_path_and_reason() {
        let err = FileError::new("/tmp/x.bin", io::ErrorKind::PermissionDenied, "Permission denied");
        assert_eq!(err.to_string(), "/tmp/x.bin: Permission denied");
    }

    #[test]
    fn from_io_keeps_kind() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = FileError::from_io(Path::new("a.txt"), &io_err);
        assert_eq!(err.kind, io::ErrorKind::NotFound);
        assert_eq!(err.reason, "gone");
    }

    #[test]
    fn scan_error_messages() {
        let err = ScanError::RootNotFound(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "directory not found: '/nope'");
        assert_eq!(ScanError::Cancelled.to_string(), "scan cancelled");
    }
}
