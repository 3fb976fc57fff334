// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Download outcome and attempt error types.

use std::path::PathBuf;

use crate::remote::RemoteError;

/// Status tag of a [`DownloadOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadStatus {
    Ok,
    Skip,
    SkippedVideo,
    Error,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Skip => "skip",
            Self::SkippedVideo => "skipped_video",
            Self::Error => "error",
        }
    }
}

/// Result of handling one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Downloaded and saved at this path
    Ok(PathBuf),
    /// Already present and non-empty at this path
    Skip(PathBuf),
    /// Video not downloaded because videos are skipped
    SkippedVideo,
    /// Every attempt failed; `"{kind}: {message}"` of the last error
    Error(String),
}

impl DownloadOutcome {
    pub fn status(&self) -> DownloadStatus {
        match self {
            Self::Ok(_) => DownloadStatus::Ok,
            Self::Skip(_) => DownloadStatus::Skip,
            Self::SkippedVideo => DownloadStatus::SkippedVideo,
            Self::Error(_) => DownloadStatus::Error,
        }
    }

    /// The target path, for outcomes that have one.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Ok(path) | Self::Skip(path) => Some(path),
            Self::SkippedVideo | Self::Error(_) => None,
        }
    }
}

/// Failure of a single fetch-and-save attempt.
#[derive(Debug)]
pub enum AttemptError {
    /// Fetching from the service failed.
    Remote(RemoteError),
    /// Reading the body or writing the file failed.
    Io(std::io::Error),
}

impl AttemptError {
    /// Short name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Remote(err) => err.kind(),
            Self::Io(_) => "IoError",
        }
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote(err) => err.is_retryable(),
            Self::Io(err) => err.kind() != std::io::ErrorKind::PermissionDenied,
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AttemptError {}

impl From<RemoteError> for AttemptError {
    fn from(err: RemoteError) -> Self {
        Self::Remote(err)
    }
}

impl From<std::io::Error> for AttemptError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_status_tags() {
        assert_eq!(DownloadOutcome::Ok(PathBuf::from("a")).status().as_str(), "ok");
        assert_eq!(DownloadOutcome::Skip(PathBuf::from("a")).status().as_str(), "skip");
        assert_eq!(DownloadOutcome::SkippedVideo.status().as_str(), "skipped_video");
        assert_eq!(DownloadOutcome::Error("x".into()).status().as_str(), "error");
        assert!(DownloadOutcome::SkippedVideo.path().is_none());
    }

    #[test]
    fn test_io_classification() {
        let denied = AttemptError::from(io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert!(!denied.is_retryable());
        let reset = AttemptError::from(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(reset.is_retryable());
        assert_eq!(reset.kind(), "IoError");
    }
}
