// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fatal diagnostics printed before the process exits.

use std::fmt::Write;

/// Closing line of every diagnostic.
pub const VERBOSE_HINT: &str = "Re-run with --verbose for more detail.";

/// Collects a title, likely causes and suggested fixes for a fatal error.
///
/// # Example
///
/// ```
/// use photo_monthly::error::ErrorBuilder;
///
/// let text = ErrorBuilder::new("2FA failed")
///     .cause("The code expired")
///     .fix("Request a new code and run again")
///     .build();
/// assert!(text.starts_with("[✗] 2FA failed"));
/// assert!(text.contains("  1. Request a new code and run again"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorBuilder {
    title: String,
    causes: Vec<String>,
    fixes: Vec<String>,
}

impl ErrorBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn fix(mut self, fix: impl Into<String>) -> Self {
        self.fixes.push(fix.into());
        self
    }

    /// Render the diagnostic. Empty sections are left out.
    pub fn build(self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "[✗] {}\n", self.title);

        if !self.causes.is_empty() {
            let _ = writeln!(out, "Possible causes:");
            for cause in &self.causes {
                let _ = writeln!(out, "  - {}", cause);
            }
            out.push('\n');
        }

        if !self.fixes.is_empty() {
            let _ = writeln!(out, "Try these fixes:");
            for (n, fix) in self.fixes.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", n + 1, fix);
            }
            out.push('\n');
        }

        out.push_str(VERBOSE_HINT);
        out
    }
}
