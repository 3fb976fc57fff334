// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Signing in to the photo service.
//!
//! Credentials come from a [`CredentialProvider`] so the login flow does not
//! care whether a person is typing at a terminal or a test is answering.
//!
//! # Example
//!
//! ```no_run
//! use photo_monthly::auth::{login, InteractivePrompter};
//! use photo_monthly::remote::http::HttpPhotoService;
//!
//! let service = HttpPhotoService::new("http://127.0.0.1:8383")?;
//! let prompter = InteractivePrompter::new(std::env::var("ICLOUD_USER").ok());
//! let session = login(&service, &prompter)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod prompt;

use crate::remote::{PhotoService, PhotoSession, RemoteError};
use crate::utils::mask_sensitive;

pub use prompt::InteractivePrompter;

/// Source of the values a login needs.
pub trait CredentialProvider {
    /// Account identity (usually an email address).
    fn identity(&self) -> anyhow::Result<String>;

    /// Secret for `identity`. Never logged.
    fn secret(&self, identity: &str) -> anyhow::Result<String>;

    /// One-time second-factor code.
    fn second_factor_code(&self) -> anyhow::Result<String>;
}

/// Why a login could not produce a session.
#[derive(Debug)]
pub enum AuthError {
    /// The service rejected the identity/secret pair.
    Rejected(String),
    /// The one-time code was refused.
    SecondFactorRejected,
    /// A credential prompt failed or was cancelled.
    Prompt(String),
    /// Any other service failure during login.
    Remote(RemoteError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "Login failed: {}", reason),
            Self::SecondFactorRejected => write!(f, "2FA failed"),
            Self::Prompt(msg) => write!(f, "Could not read credentials: {}", msg),
            Self::Remote(err) => write!(f, "Login failed: {}", err),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for AuthError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::AuthRejected(reason) => Self::Rejected(reason),
            other => Self::Remote(other),
        }
    }
}

/// Sign in, completing the second-factor challenge when the service asks for one.
pub fn login(
    service: &dyn PhotoService,
    credentials: &dyn CredentialProvider,
) -> Result<Box<dyn PhotoSession>, AuthError> {
    let identity = credentials
        .identity()
        .map_err(|e| AuthError::Prompt(e.to_string()))?
        .trim()
        .to_string();
    let secret = credentials
        .secret(&identity)
        .map_err(|e| AuthError::Prompt(e.to_string()))?;

    tracing::info!(identity = %mask_sensitive(&identity, 3), "Signing in");
    let mut session = service.authenticate(&identity, secret.trim())?;

    if session.requires_second_factor() {
        tracing::info!("Second factor required");
        let code = credentials
            .second_factor_code()
            .map_err(|e| AuthError::Prompt(e.to_string()))?;

        if !session.validate_second_factor_code(code.trim())? {
            return Err(AuthError::SecondFactorRejected);
        }
        tracing::debug!("Second factor accepted");
    }

    Ok(session)
}
