// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Photo service integration.
//!
//! The sync loop only sees two traits: [`PhotoService`] signs in and hands back
//! a [`PhotoSession`], which lists the library and fetches asset bytes.
//! [`http::HttpPhotoService`] is the concrete adapter used by the binary;
//! tests plug in in-memory doubles.
//!
//! # Example
//!
//! ```no_run
//! use photo_monthly::remote::{http::HttpPhotoService, PhotoService};
//!
//! let service = HttpPhotoService::new("http://127.0.0.1:8383")?;
//! let mut session = service.authenticate("me@example.com", "secret")?;
//! let assets = session.all_assets()?;
//! println!("{} assets in library", assets.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod http;

use std::io::Read;

use crate::assets::Asset;

/// Error types specific to photo service operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The service rejected the identity/secret pair.
    AuthRejected(String),
    /// Connection failure, timeout, or an interrupted body.
    Network(String),
    /// Non-success HTTP status.
    Http { status: u16, message: String },
    /// The service answered with something we could not understand.
    InvalidResponse(String),
}

impl RemoteError {
    /// Short name of the error class, used in per-asset error lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthRejected(_) => "AuthRejected",
            Self::Network(_) => "NetworkError",
            Self::Http { .. } => "HttpError",
            Self::InvalidResponse(_) => "InvalidResponse",
        }
    }

    /// Whether trying the same request again could succeed.
    ///
    /// Network failures, request timeouts, rate limiting and server errors
    /// are transient; everything else is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status == 408 || *status == 429 || (500..600).contains(status),
            Self::AuthRejected(_) | Self::InvalidResponse(_) => false,
        }
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthRejected(msg) => write!(f, "Sign-in rejected: {}", msg),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Http { status, message } => write!(f, "HTTP {}: {}", status, message),
            Self::InvalidResponse(msg) => write!(f, "Invalid response from photo service: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Bytes of one asset, as handed over by the service.
///
/// The variant is chosen once by the adapter so the writer has one code path
/// per shape.
pub enum Payload {
    /// A body to be read incrementally.
    Streamed(Box<dyn Read>),
    /// A body already held in memory.
    Raw(Vec<u8>),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Streamed(_) => f.write_str("Payload::Streamed"),
            Self::Raw(bytes) => write!(f, "Payload::Raw({} bytes)", bytes.len()),
        }
    }
}

/// Signs in to a photo service.
pub trait PhotoService {
    /// Authenticate and open a session.
    ///
    /// A rejected identity/secret pair is reported as
    /// [`RemoteError::AuthRejected`].
    fn authenticate(&self, identity: &str, secret: &str) -> Result<Box<dyn PhotoSession>, RemoteError>;
}

/// An authenticated session.
pub trait PhotoSession {
    /// Whether the service wants a one-time code before the session is usable.
    fn requires_second_factor(&self) -> bool;

    /// Submit a one-time code. `Ok(false)` means the code was refused.
    fn validate_second_factor_code(&mut self, code: &str) -> Result<bool, RemoteError>;

    /// The complete library listing. Can be slow for large libraries.
    fn all_assets(&mut self) -> Result<Vec<Asset>, RemoteError>;

    /// Fetch the original bytes of `asset`.
    fn download(&self, asset: &Asset) -> Result<Payload, RemoteError>;
}
