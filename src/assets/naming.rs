// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Deterministic local file names for assets.
//!
//! The same asset always maps to the same name, which is what lets a re-run
//! recognise files it already downloaded.

use super::{Asset, AssetKind};

/// Characters that are invalid in file names on common filesystems.
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Timestamp layout used as the file name prefix.
const TIME_TAG_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Prefix used when the asset has no creation time.
const UNKNOWN_TIME_TAG: &str = "unknown";

/// Strip reserved characters and surrounding whitespace.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| !RESERVED_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `{YYYYMMDD_HHMMSS}_{filename or id}`, sanitized.
pub fn base_name(asset: &Asset) -> String {
    let time_tag = asset
        .created
        .map(|created| created.format(TIME_TAG_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_TIME_TAG.to_string());

    let name_or_id = asset
        .filename
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(&asset.id);

    sanitize(&format!("{time_tag}_{name_or_id}"))
}

/// Extension including the leading dot.
///
/// Taken from the original file name when it has one, lowercased; otherwise
/// `.mov` for videos and `.jpg` for everything else.
pub fn extension(asset: &Asset) -> String {
    let name = asset.filename.as_deref().unwrap_or_default().to_lowercase();
    if let Some((_, ext)) = name.rsplit_once('.') {
        return format!(".{ext}");
    }

    match asset.kind {
        AssetKind::Video => ".mov".to_string(),
        AssetKind::Photo => ".jpg".to_string(),
    }
}

/// Final file name: [`base_name`] followed by [`extension`].
pub fn target_filename(asset: &Asset) -> String {
    format!("{}{}", base_name(asset), extension(asset))
}
