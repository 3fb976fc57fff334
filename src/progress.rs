// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Spinner and progress bar helpers for consistent terminal output.
//!
//! Both draw to stderr and stay hidden when stderr is not a terminal.

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner with consistent styling.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("\u{28FB}\u{28F9}\u{28FC}\u{28F8}\u{28FE}\u{28F6}\u{28F7}\u{28E7}\u{28CF}\u{28DF} ")
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Finish spinner with success message.
pub fn finish_success(spinner: &ProgressBar, message: &str) {
    spinner.finish_and_clear();
    println!("{} {}", "[OK]".green(), message);
}

/// Finish spinner with error message.
pub fn finish_error(spinner: &ProgressBar, message: &str) {
    spinner.finish_and_clear();
    println!("{} {}", "[X]".red(), message);
}

/// Progress bar over the `len` assets of one month, tqdm-style.
pub fn month_bar(len: u64, tag: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg}: {percent:>3}%|{bar:30.cyan/blue}| {pos}/{len} [{elapsed_precise}<{eta_precise}] {per_sec}")
    {
        bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
    }
    bar.set_message(format!("Downloading {}", tag));
    bar
}
