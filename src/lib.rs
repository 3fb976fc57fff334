// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! photo-monthly - month-by-month photo library downloader
//!
//! Signs in to a photo service, lists the library once, and downloads every
//! item created in the configured months into `{output}/{YYYY-MM}/`. Files
//! that are already present are skipped, so a run can simply be repeated.
//!
//! # Core Modules
//!
//! - [`auth`] - Login flow and credential prompts
//! - [`months`] - Month ranges and inclusive month bounds
//! - [`assets`] - Asset records, month filtering and file naming
//! - [`download`] - Per-asset download with retries and atomic save
//! - [`sync`] - The month-by-month run
//! - [`remote`] - Photo service traits and the HTTP adapter
//! - [`config`] - Layered, validated configuration
//! - [`error`] - Diagnostic formatting

pub mod assets;
pub mod auth;
pub mod config;
pub mod download;
pub mod error;
pub mod months;
pub mod progress;
pub mod remote;
pub mod sync;
pub mod utils;

pub use assets::{filter_by_month, target_filename, Asset, AssetKind};
pub use auth::{login, AuthError, CredentialProvider, InteractivePrompter};
pub use config::{Config, Settings};
pub use download::{DownloadOutcome, DownloadStatus, Downloader};
pub use error::ErrorBuilder;
pub use months::{month_bounds, month_range, MonthBounds, YearMonth};
pub use remote::{Payload, PhotoService, PhotoSession, RemoteError};
pub use sync::{SyncRunner, SyncSummary};
pub use utils::{mask_sensitive, Sleeper, ThreadSleeper};
