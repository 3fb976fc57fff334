// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-asset download with retry and atomic save.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::{target_filename, Asset};
use crate::config::Config;
use crate::remote::{Payload, PhotoSession};
use crate::utils::Sleeper;

use super::types::{AttemptError, DownloadOutcome};

/// Read/write chunk size for streamed bodies.
pub const CHUNK_SIZE: usize = 512 * 1024;

/// Backoff unit: attempt `n` is followed by a pause of `n * BACKOFF_STEP`.
pub const BACKOFF_STEP: Duration = Duration::from_millis(1500);

/// Suffix of the temporary file an attempt writes to.
pub const PART_SUFFIX: &str = ".part";

/// Pause after failed attempt number `attempt` (1-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    BACKOFF_STEP * attempt
}

/// Where `asset` is saved inside `out_dir`.
pub fn target_path(out_dir: &Path, asset: &Asset) -> PathBuf {
    out_dir.join(target_filename(asset))
}

/// Temporary path used while `target` is being written.
pub fn part_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

/// A target counts as downloaded when it is a non-empty regular file.
pub fn is_complete(target: &Path) -> bool {
    fs::metadata(target)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

/// Downloads single assets according to the run configuration.
pub struct Downloader<'a> {
    config: &'a Config,
    sleeper: &'a dyn Sleeper,
}

impl<'a> Downloader<'a> {
    pub fn new(config: &'a Config, sleeper: &'a dyn Sleeper) -> Self {
        Self { config, sleeper }
    }

    /// Download `asset` into `out_dir` unless it is skipped or already there.
    ///
    /// Retryable failures are retried up to `max_retries` attempts in total,
    /// pausing `1.5s * attempt` after each failure. A terminal failure stops
    /// immediately. Nothing is ever left at the target path by a failed
    /// attempt.
    pub fn download_asset(&self, session: &dyn PhotoSession, asset: &Asset, out_dir: &Path) -> DownloadOutcome {
        if self.config.skip_videos && asset.is_video() {
            tracing::debug!(id = %asset.id, "Skipping video");
            return DownloadOutcome::SkippedVideo;
        }

        let target = target_path(out_dir, asset);
        if is_complete(&target) {
            tracing::debug!(path = %target.display(), "Already downloaded");
            return DownloadOutcome::Skip(target);
        }

        let mut last_error = None;

        for attempt in 1..=self.config.max_retries {
            match fetch_and_save(session, asset, &target) {
                Ok(bytes) => {
                    tracing::debug!(path = %target.display(), bytes, attempt, "Saved asset");
                    return DownloadOutcome::Ok(target);
                }
                Err(err) => {
                    let retryable = err.is_retryable();
                    tracing::warn!(
                        id = %asset.id,
                        attempt,
                        max_attempts = self.config.max_retries,
                        retryable,
                        "Download attempt failed: {}",
                        err
                    );
                    last_error = Some(err);

                    if !retryable {
                        break;
                    }
                    self.sleeper.sleep(backoff_delay(attempt));
                }
            }
        }

        match last_error {
            Some(err) => DownloadOutcome::Error(format!("{}: {}", err.kind(), err)),
            None => DownloadOutcome::Error("NoAttempt: download was never attempted".to_string()),
        }
    }
}

/// One attempt: fetch, write to the part file, rename into place.
fn fetch_and_save(session: &dyn PhotoSession, asset: &Asset, target: &Path) -> Result<u64, AttemptError> {
    let payload = session.download(asset)?;
    let part = part_path(target);

    let written = match write_payload(payload, &part) {
        Ok(written) => written,
        Err(err) => {
            let _ = fs::remove_file(&part);
            return Err(err);
        }
    };

    if let Err(err) = fs::rename(&part, target) {
        let _ = fs::remove_file(&part);
        return Err(err.into());
    }

    Ok(written)
}

/// Write the whole payload to `path`, returning the number of bytes written.
///
/// The file is synced before returning and closed when it goes out of scope,
/// on success and on every error path.
fn write_payload(payload: Payload, path: &Path) -> Result<u64, AttemptError> {
    let mut file = File::create(path)?;

    let written = match payload {
        Payload::Streamed(mut reader) => {
            let mut buffer = vec![0u8; CHUNK_SIZE];
            let mut total = 0u64;
            loop {
                let read = match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(read) => read,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                };
                file.write_all(&buffer[..read])?;
                total += read as u64;
            }
            total
        }
        Payload::Raw(bytes) => {
            file.write_all(&bytes)?;
            bytes.len() as u64
        }
    };

    file.sync_all()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetKind;
    use crate::download::DownloadStatus;
    use crate::remote::RemoteError;
    use chrono::{TimeZone, Utc};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io::{self, Cursor};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSleeper {
        pauses: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.pauses.borrow_mut().push(duration);
        }
    }

    enum Reply {
        Raw(Vec<u8>),
        Streamed(Vec<u8>),
        BrokenStream,
        Fail(RemoteError),
    }

    /// Replies are consumed in order; the last one repeats.
    struct ScriptedSession {
        replies: RefCell<VecDeque<Reply>>,
        calls: Cell<usize>,
    }

    impl ScriptedSession {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: Cell::new(0),
            }
        }
    }

    struct BrokenReader {
        sent: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"half");
            Ok(4)
        }
    }

    impl PhotoSession for ScriptedSession {
        fn requires_second_factor(&self) -> bool {
            false
        }

        fn validate_second_factor_code(&mut self, _code: &str) -> Result<bool, RemoteError> {
            Ok(true)
        }

        fn all_assets(&mut self) -> Result<Vec<Asset>, RemoteError> {
            Ok(Vec::new())
        }

        fn download(&self, _asset: &Asset) -> Result<Payload, RemoteError> {
            self.calls.set(self.calls.get() + 1);
            let mut replies = self.replies.borrow_mut();
            let reply = if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                match replies.front().unwrap() {
                    Reply::Raw(b) => Reply::Raw(b.clone()),
                    Reply::Streamed(b) => Reply::Streamed(b.clone()),
                    Reply::BrokenStream => Reply::BrokenStream,
                    Reply::Fail(e) => Reply::Fail(e.clone()),
                }
            };
            match reply {
                Reply::Raw(bytes) => Ok(Payload::Raw(bytes)),
                Reply::Streamed(bytes) => Ok(Payload::Streamed(Box::new(Cursor::new(bytes)))),
                Reply::BrokenStream => Ok(Payload::Streamed(Box::new(BrokenReader { sent: false }))),
                Reply::Fail(err) => Err(err),
            }
        }
    }

    fn config(dir: &Path, skip_videos: bool) -> Config {
        Config {
            start_month: "2026-01".parse().unwrap(),
            end_month: "2026-01".parse().unwrap(),
            sleep_between_downloads: Duration::ZERO,
            skip_videos,
            max_retries: 3,
            output_dir: dir.to_path_buf(),
            identity: None,
            service_url: "http://127.0.0.1:1".to_string(),
        }
    }

    fn photo(kind: AssetKind) -> Asset {
        Asset {
            id: "A1".to_string(),
            filename: Some("IMG_0001.JPG".to_string()),
            kind,
            created: Some(Utc.with_ymd_and_hms(2026, 1, 5, 10, 20, 30).unwrap()),
            download_url: "/download/A1".to_string(),
        }
    }

    #[test]
    fn test_raw_payload_saved() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), false);
        let sleeper = RecordingSleeper::default();
        let session = ScriptedSession::new(vec![Reply::Raw(b"jpeg bytes".to_vec())]);

        let outcome = Downloader::new(&config, &sleeper).download_asset(&session, &photo(AssetKind::Photo), dir.path());

        let expected = dir.path().join("20260105_102030_IMG_0001.JPG.jpg");
        assert_eq!(outcome, DownloadOutcome::Ok(expected.clone()));
        assert_eq!(fs::read(&expected).unwrap(), b"jpeg bytes");
        assert!(!part_path(&expected).exists());
        assert!(sleeper.pauses.borrow().is_empty());
    }

    #[test]
    fn test_streamed_payload_spanning_chunks() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), false);
        let sleeper = RecordingSleeper::default();
        let body: Vec<u8> = (0..CHUNK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
        let session = ScriptedSession::new(vec![Reply::Streamed(body.clone())]);

        let outcome = Downloader::new(&config, &sleeper).download_asset(&session, &photo(AssetKind::Photo), dir.path());

        let path = outcome.path().cloned().unwrap();
        assert_eq!(fs::read(path).unwrap(), body);
    }

    #[test]
    fn test_existing_file_skipped_without_network() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), false);
        let sleeper = RecordingSleeper::default();
        let asset = photo(AssetKind::Photo);
        let target = target_path(dir.path(), &asset);
        fs::write(&target, b"already here").unwrap();
        let session = ScriptedSession::new(vec![Reply::Raw(b"new".to_vec())]);

        let outcome = Downloader::new(&config, &sleeper).download_asset(&session, &asset, dir.path());

        assert_eq!(outcome, DownloadOutcome::Skip(target.clone()));
        assert_eq!(session.calls.get(), 0);
        assert_eq!(fs::read(&target).unwrap(), b"already here");
    }

    #[test]
    fn test_empty_existing_file_downloaded_again() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), false);
        let sleeper = RecordingSleeper::default();
        let asset = photo(AssetKind::Photo);
        let target = target_path(dir.path(), &asset);
        fs::write(&target, b"").unwrap();
        let session = ScriptedSession::new(vec![Reply::Raw(b"fresh".to_vec())]);

        let outcome = Downloader::new(&config, &sleeper).download_asset(&session, &asset, dir.path());

        assert_eq!(outcome.status(), DownloadStatus::Ok);
        assert_eq!(fs::read(&target).unwrap(), b"fresh");
    }

    #[test]
    fn test_videos_skipped_when_configured() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), true);
        let sleeper = RecordingSleeper::default();
        let session = ScriptedSession::new(vec![Reply::Raw(b"movie".to_vec())]);

        let outcome = Downloader::new(&config, &sleeper).download_asset(&session, &photo(AssetKind::Video), dir.path());

        assert_eq!(outcome, DownloadOutcome::SkippedVideo);
        assert_eq!(session.calls.get(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let still = Downloader::new(&config, &sleeper).download_asset(&session, &photo(AssetKind::Photo), dir.path());
        assert!(matches!(still, DownloadOutcome::Ok(_)));
    }

    #[test]
    fn test_retry_exhaustion_backs_off_linearly() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), false);
        let sleeper = RecordingSleeper::default();
        let session = ScriptedSession::new(vec![Reply::Fail(RemoteError::Network("connection reset".into()))]);
        let asset = photo(AssetKind::Photo);

        let outcome = Downloader::new(&config, &sleeper).download_asset(&session, &asset, dir.path());

        assert_eq!(
            outcome,
            DownloadOutcome::Error("NetworkError: Network error: connection reset".to_string())
        );
        assert_eq!(session.calls.get(), 3);
        assert_eq!(
            *sleeper.pauses.borrow(),
            vec![
                Duration::from_millis(1500),
                Duration::from_millis(3000),
                Duration::from_millis(4500)
            ]
        );
        let target = target_path(dir.path(), &asset);
        assert!(!target.exists());
        assert!(!part_path(&target).exists());
    }

    #[test]
    fn test_recovers_after_transient_failure() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), false);
        let sleeper = RecordingSleeper::default();
        let session = ScriptedSession::new(vec![
            Reply::Fail(RemoteError::Http { status: 503, message: "busy".into() }),
            Reply::Raw(b"ok".to_vec()),
        ]);

        let outcome = Downloader::new(&config, &sleeper).download_asset(&session, &photo(AssetKind::Photo), dir.path());

        assert!(matches!(outcome, DownloadOutcome::Ok(_)));
        assert_eq!(session.calls.get(), 2);
        assert_eq!(*sleeper.pauses.borrow(), vec![Duration::from_millis(1500)]);
    }

    #[test]
    fn test_terminal_error_not_retried() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), false);
        let sleeper = RecordingSleeper::default();
        let session = ScriptedSession::new(vec![Reply::Fail(RemoteError::Http {
            status: 404,
            message: "gone".into(),
        })]);

        let outcome = Downloader::new(&config, &sleeper).download_asset(&session, &photo(AssetKind::Photo), dir.path());

        assert_eq!(outcome, DownloadOutcome::Error("HttpError: HTTP 404: gone".to_string()));
        assert_eq!(session.calls.get(), 1);
        assert!(sleeper.pauses.borrow().is_empty());
    }

    #[test]
    fn test_broken_stream_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), false);
        let sleeper = RecordingSleeper::default();
        let session = ScriptedSession::new(vec![Reply::BrokenStream]);
        let asset = photo(AssetKind::Photo);

        let outcome = Downloader::new(&config, &sleeper).download_asset(&session, &asset, dir.path());

        assert_eq!(outcome.status(), DownloadStatus::Error);
        assert!(matches!(&outcome, DownloadOutcome::Error(msg) if msg.starts_with("IoError: ")));
        assert_eq!(session.calls.get(), 3);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(1), Duration::from_millis(1500));
        assert_eq!(backoff_delay(2), Duration::from_millis(3000));
        assert_eq!(backoff_delay(3), Duration::from_millis(4500));
    }

    #[test]
    fn test_part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/2026-01/a.jpg")),
            PathBuf::from("/tmp/2026-01/a.jpg.part")
        );
    }
}
