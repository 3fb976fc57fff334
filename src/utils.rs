// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Small helpers shared across the crate.

use std::time::Duration;

/// Mask an account identity (like an email address) for logging.
///
/// Shows only the first `visible_prefix` characters and replaces the rest with "...".
///
/// # Examples
///
/// ```
/// use photo_monthly::utils::mask_sensitive;
///
/// assert_eq!(mask_sensitive("someone@example.com", 3), "som...");
/// ```
pub fn mask_sensitive(input: &str, visible_prefix: usize) -> String {
    let prefix: String = input.chars().take(visible_prefix).collect();
    format!("{}...", prefix)
}

/// Blocks the current thread for a while.
///
/// Retry backoff and download pacing go through this so tests can record the
/// requested pauses instead of waiting them out.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
