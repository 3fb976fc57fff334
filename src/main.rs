// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use photo_monthly::auth::{login, AuthError, InteractivePrompter};
use photo_monthly::config::{Config, Settings};
use photo_monthly::error::ErrorBuilder;
use photo_monthly::remote::http::HttpPhotoService;
use photo_monthly::sync::{ensure_dir, SyncRunner};
use photo_monthly::utils::ThreadSleeper;

/// Process exit codes.
mod exit_codes {
    /// Login or second-factor failure
    pub const AUTH_FAILURE: i32 = 1;
}

/// Download a photo library month by month.
///
/// Settings are read from the config file, then ICLOUD_USER / ICLOUD_OUT /
/// ICLOUD_SERVICE_URL, then these flags; later sources win.
#[derive(Parser, Debug)]
#[command(name = "photo-monthly", version, about, long_about = None)]
struct Cli {
    /// First month to download (inclusive)
    #[arg(long, value_name = "YYYY-MM")]
    start: Option<String>,

    /// Last month to download (inclusive)
    #[arg(long, value_name = "YYYY-MM")]
    end: Option<String>,

    /// Base output directory (default: Downloads/Photos)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Do not download videos
    #[arg(long)]
    skip_videos: bool,

    /// Seconds to pause after each successful download
    #[arg(long, value_name = "SECS")]
    sleep: Option<f64>,

    /// Download attempts per item
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Photo service base URL
    #[arg(long, value_name = "URL")]
    service_url: Option<String>,

    /// Config file (default: ~/.photo-monthly/config.json)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            start_month: self.start.clone(),
            end_month: self.end.clone(),
            sleep_between_downloads: self.sleep,
            skip_videos: self.skip_videos.then_some(true),
            max_retries: self.retries,
            output_dir: self.output.clone(),
            identity: None,
            service_url: self.service_url.clone(),
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn auth_diagnostic(err: &AuthError) -> String {
    let builder = ErrorBuilder::new(err.to_string());
    match err {
        AuthError::Rejected(_) => builder
            .cause("Wrong email or password")
            .cause("Account locked after too many attempts")
            .fix("Check the credentials and run again")
            .fix("Set ICLOUD_USER to skip the email prompt"),
        AuthError::SecondFactorRejected => builder
            .cause("The code was mistyped or has expired")
            .fix("Request a fresh code on a trusted device and run again"),
        AuthError::Prompt(_) => builder
            .cause("Input was cancelled or stdin is not a terminal")
            .fix("Run from an interactive terminal"),
        AuthError::Remote(_) => builder
            .cause("Photo service unreachable")
            .cause("Wrong service URL")
            .fix("Check --service-url or ICLOUD_SERVICE_URL"),
    }
    .build()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };
    let settings = file_settings
        .merge(Settings::from_env(|key| std::env::var(key).ok()))
        .merge(cli.settings());
    let config = Config::from_settings(settings)?;
    tracing::debug!(
        start = %config.start_month,
        end = %config.end_month,
        output = %config.output_dir.display(),
        skip_videos = config.skip_videos,
        "Resolved configuration"
    );

    ensure_dir(&config.output_dir)?;

    let service = HttpPhotoService::new(config.service_url.as_str())?;
    let prompter = InteractivePrompter::new(config.identity.clone());

    let mut session = match login(&service, &prompter) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{}", auth_diagnostic(&err).red());
            std::process::exit(exit_codes::AUTH_FAILURE);
        }
    };

    SyncRunner::new(&config, &ThreadSleeper).run(session.as_mut())?;
    Ok(())
}
