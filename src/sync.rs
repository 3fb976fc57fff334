// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The month-by-month sync loop.
//!
//! The listing is fetched once, then each month of the configured range gets
//! its own `YYYY-MM` directory and is downloaded asset by asset. A failed
//! asset is reported and skipped; only directory and listing failures stop
//! the run.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::assets::filter_by_month;
use crate::config::Config;
use crate::download::{DownloadOutcome, Downloader};
use crate::months::{month_bounds, month_range};
use crate::progress;
use crate::remote::PhotoSession;
use crate::utils::Sleeper;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Months processed
    pub months: usize,
    /// Assets that fell inside a processed month
    pub matched: usize,
    pub downloaded: usize,
    /// Already present on disk
    pub skipped: usize,
    pub skipped_videos: usize,
    pub failed: usize,
}

impl SyncSummary {
    fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Ok(_) => self.downloaded += 1,
            DownloadOutcome::Skip(_) => self.skipped += 1,
            DownloadOutcome::SkippedVideo => self.skipped_videos += 1,
            DownloadOutcome::Error(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} already present, {} videos skipped, {} failed",
            self.downloaded, self.skipped, self.skipped_videos, self.failed
        )
    }
}

/// Create `path` and any missing parents. Safe to call repeatedly.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Runs the whole sync against an authenticated session.
pub struct SyncRunner<'a> {
    config: &'a Config,
    sleeper: &'a dyn Sleeper,
}

impl<'a> SyncRunner<'a> {
    pub fn new(config: &'a Config, sleeper: &'a dyn Sleeper) -> Self {
        Self { config, sleeper }
    }

    pub fn run(&self, session: &mut dyn PhotoSession) -> Result<SyncSummary> {
        let base = &self.config.output_dir;
        ensure_dir(base)?;

        let spinner = progress::spinner("Fetching photo library (first time may be slow)...");
        let assets = match session.all_assets() {
            Ok(assets) => {
                progress::finish_success(&spinner, &format!("{} item(s) in library", assets.len()));
                assets
            }
            Err(err) => {
                progress::finish_error(&spinner, "Could not fetch the photo library");
                return Err(err).context("Failed to fetch photo library");
            }
        };
        tracing::info!(total = assets.len(), "Fetched library listing");

        let downloader = Downloader::new(self.config, self.sleeper);
        let mut summary = SyncSummary::default();

        for month in month_range(self.config.start_month, self.config.end_month) {
            let tag = month.tag();
            let out_dir = base.join(&tag);
            ensure_dir(&out_dir)?;

            let matched = filter_by_month(&assets, &month_bounds(month));
            println!("\n{}: {} item(s)", tag, matched.len());
            summary.months += 1;
            summary.matched += matched.len();

            let bar = progress::month_bar(matched.len() as u64, &tag);
            for asset in matched {
                let outcome = downloader.download_asset(&*session, asset, &out_dir);
                match &outcome {
                    DownloadOutcome::Ok(_) => self.sleeper.sleep(self.config.sleep_between_downloads),
                    DownloadOutcome::Error(message) => {
                        bar.suspend(|| println!("{} {}", "Error:".red(), message));
                    }
                    DownloadOutcome::Skip(_) | DownloadOutcome::SkippedVideo => {}
                }
                tracing::debug!(
                    id = %asset.id,
                    kind = asset.kind.as_str(),
                    status = outcome.status().as_str(),
                    "Asset processed"
                );
                summary.record(&outcome);
                bar.inc(1);
            }
            bar.finish();
        }

        println!("\n{} Files saved to: {}", "Done".green().bold(), base.display());
        println!("{}", summary);
        Ok(summary)
    }
}
