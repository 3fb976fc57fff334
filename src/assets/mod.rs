// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Remote media records and month selection.

pub mod naming;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::months::MonthBounds;

pub use naming::{base_name, extension, sanitize, target_filename};

/// Kind of media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Still image
    #[default]
    #[serde(alias = "image")]
    Photo,
    /// Movie or live-photo video
    Video,
}

impl AssetKind {
    /// Kind for a service `item_type` tag. Anything that is not a video is
    /// handled as a still.
    pub fn from_item_type(item_type: &str) -> Self {
        if item_type.eq_ignore_ascii_case("video") {
            Self::Video
        } else {
            Self::Photo
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }
}

/// A photo or video in the remote library.
///
/// The bytes are not part of the record: they are fetched on demand through
/// [`crate::remote::PhotoSession::download`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Service-side identifier
    pub id: String,
    /// Original file name, if the service knows it
    pub filename: Option<String>,
    pub kind: AssetKind,
    /// Creation time, absent for some imported items
    pub created: Option<DateTime<Utc>>,
    /// Where the original bytes can be fetched from
    pub download_url: String,
}

impl Asset {
    pub fn is_video(&self) -> bool {
        self.kind == AssetKind::Video
    }
}

/// Select the assets created inside `bounds`, keeping the listing order.
///
/// Assets without a creation time never match.
pub fn filter_by_month<'a>(assets: &'a [Asset], bounds: &MonthBounds) -> Vec<&'a Asset> {
    assets
        .iter()
        .filter(|asset| asset.created.as_ref().is_some_and(|created| bounds.contains(created)))
        .collect()
}
