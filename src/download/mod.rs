// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Asset downloads.
//!
//! Each asset is handled on its own:
//! - videos can be skipped outright by configuration
//! - a non-empty file at the target path means the asset is already done
//! - otherwise the bytes are fetched with bounded retries and linear backoff,
//!   written to a `.part` file and renamed into place only when complete
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use photo_monthly::config::{Config, Settings};
//! use photo_monthly::download::{Downloader, DownloadOutcome};
//! use photo_monthly::remote::PhotoSession;
//! use photo_monthly::utils::ThreadSleeper;
//!
//! # fn example(session: &mut dyn PhotoSession) -> anyhow::Result<()> {
//! let config = Config::from_settings(Settings::default())?;
//! let downloader = Downloader::new(&config, &ThreadSleeper);
//!
//! for asset in session.all_assets()? {
//!     if let DownloadOutcome::Error(message) = downloader.download_asset(&*session, &asset, Path::new("out")) {
//!         eprintln!("Error: {}", message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod downloader;
pub mod types;

pub use downloader::{backoff_delay, is_complete, part_path, target_path, Downloader};
pub use types::{AttemptError, DownloadOutcome, DownloadStatus};
