// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! JSON-over-HTTP photo service adapter.
//!
//! Talks to a photo gateway exposing:
//!
//! - `POST /auth/signin` with `{identity, secret}`
//! - `POST /auth/verify` with `{code}`
//! - `GET /photos?offset=&limit=` returning one page of the library
//! - `GET <download_url>` returning the original bytes
//!
//! All calls after sign-in carry the session token as a bearer token.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;

use super::{Payload, PhotoService, PhotoSession, RemoteError};
use crate::assets::{Asset, AssetKind};

/// Default photo gateway endpoint.
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8383";

/// Timeout for establishing a connection (in seconds).
const CONNECTION_TIMEOUT_SECS: u64 = 10;

/// Timeout for sign-in, verification and listing requests (in seconds).
const API_TIMEOUT_SECS: u64 = 120;

/// Timeout for a single asset download, body included (in seconds).
const DOWNLOAD_TIMEOUT_SECS: u64 = 1800;

/// Number of assets requested per listing page.
const PAGE_SIZE: u64 = 200;

/// Bodies up to this size are buffered instead of streamed.
const INLINE_PAYLOAD_LIMIT: u64 = 64 * 1024;

/// Internal response structure for sign-in.
#[derive(Debug, Deserialize)]
struct SigninResponse {
    session_token: String,
    #[serde(default)]
    requires_second_factor: bool,
}

/// Internal response structure for 2FA verification.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    valid: bool,
}

/// Internal response structure for one listing page.
#[derive(Debug, Deserialize)]
struct AssetPage {
    #[serde(default)]
    assets: Vec<AssetRecord>,
    next_offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AssetRecord {
    id: String,
    filename: Option<String>,
    /// Free-form kind tag; only `video` is treated specially.
    item_type: Option<String>,
    created: Option<DateTime<Utc>>,
    download_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client for the photo gateway.
#[derive(Debug, Clone)]
pub struct HttpPhotoService {
    base_url: String,
    client: Client,
}

impl HttpPhotoService {
    /// Create a client for the gateway at `url` (e.g. "http://127.0.0.1:8383").
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
            .timeout(None::<Duration>)
            .user_agent(concat!("photo-monthly/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl PhotoService for HttpPhotoService {
    fn authenticate(&self, identity: &str, secret: &str) -> Result<Box<dyn PhotoSession>, RemoteError> {
        let url = format!("{}/auth/signin", self.base_url);
        let body = serde_json::json!({
            "identity": identity,
            "secret": secret,
        });

        let response = send(
            self.client
                .post(&url)
                .json(&body)
                .timeout(Duration::from_secs(API_TIMEOUT_SECS)),
        )?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::AuthRejected(error_message(response)));
        }
        let signin: SigninResponse = parse_json(ensure_success(response)?)?;

        tracing::debug!(
            requires_second_factor = signin.requires_second_factor,
            "Signed in to photo service"
        );

        Ok(Box::new(HttpPhotoSession {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            token: signin.session_token,
            requires_second_factor: signin.requires_second_factor,
        }))
    }
}

/// Session opened by [`HttpPhotoService`].
#[derive(Debug)]
pub struct HttpPhotoSession {
    base_url: String,
    client: Client,
    token: String,
    requires_second_factor: bool,
}

impl HttpPhotoSession {
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }

    fn fetch_page(&self, offset: u64) -> Result<AssetPage, RemoteError> {
        let url = format!("{}/photos", self.base_url);
        let response = send(
            self.client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[("offset", offset), ("limit", PAGE_SIZE)])
                .timeout(Duration::from_secs(API_TIMEOUT_SECS)),
        )?;
        parse_json(ensure_success(response)?)
    }
}

impl PhotoSession for HttpPhotoSession {
    fn requires_second_factor(&self) -> bool {
        self.requires_second_factor
    }

    fn validate_second_factor_code(&mut self, code: &str) -> Result<bool, RemoteError> {
        let url = format!("{}/auth/verify", self.base_url);
        let response = send(
            self.client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&serde_json::json!({ "code": code }))
                .timeout(Duration::from_secs(API_TIMEOUT_SECS)),
        )?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(false);
        }

        let verify: VerifyResponse = parse_json(ensure_success(response)?)?;
        if verify.valid {
            self.requires_second_factor = false;
        }
        Ok(verify.valid)
    }

    fn all_assets(&mut self) -> Result<Vec<Asset>, RemoteError> {
        let mut assets = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(offset)?;
            let page_len = page.assets.len();
            tracing::debug!(offset, page_len, "Fetched listing page");

            assets.extend(page.assets.into_iter().map(|record| Asset {
                id: record.id,
                filename: record.filename,
                kind: record.item_type.as_deref().map_or(AssetKind::Photo, AssetKind::from_item_type),
                created: record.created,
                download_url: record.download_url,
            }));

            match page.next_offset {
                Some(_) if page_len == 0 => break,
                Some(next) if next <= offset => {
                    return Err(RemoteError::InvalidResponse(format!(
                        "listing offset went backwards ({} -> {})",
                        offset, next
                    )));
                }
                Some(next) => offset = next,
                None => break,
            }
        }

        Ok(assets)
    }

    fn download(&self, asset: &Asset) -> Result<Payload, RemoteError> {
        let url = self.resolve(&asset.download_url);
        let response = ensure_success(send(
            self.client
                .get(&url)
                .bearer_auth(&self.token)
                .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS)),
        )?)?;

        match response.content_length() {
            Some(len) if len <= INLINE_PAYLOAD_LIMIT => {
                let bytes = response
                    .bytes()
                    .map_err(|e| RemoteError::Network(format!("Failed to read body: {}", e)))?;
                Ok(Payload::Raw(bytes.to_vec()))
            }
            _ => Ok(Payload::Streamed(Box::new(response))),
        }
    }
}

fn send(request: RequestBuilder) -> Result<Response, RemoteError> {
    request.send().map_err(|e| {
        if e.is_timeout() {
            RemoteError::Network(format!("Request timed out: {}", e))
        } else if e.is_connect() {
            RemoteError::Network(format!("Cannot connect to photo service: {}", e))
        } else {
            RemoteError::Network(e.to_string())
        }
    })
}

fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(RemoteError::Http {
        status: status.as_u16(),
        message: error_message(response),
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    response
        .json()
        .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
}

/// Best human-readable reason from an error response.
fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().unwrap_or_default();

    serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.error)
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string())
}
