// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Terminal prompts for credentials.

use anyhow::{Context, Result};
use inquire::{Password, PasswordDisplayMode, Text};

use super::CredentialProvider;

/// Asks for credentials on the terminal.
///
/// A preset identity (from the environment or config) is used as-is when it
/// is non-empty; the secret and the 2FA code are always typed in.
#[derive(Debug, Clone, Default)]
pub struct InteractivePrompter {
    preset_identity: Option<String>,
}

impl InteractivePrompter {
    pub fn new(preset_identity: Option<String>) -> Self {
        Self {
            preset_identity: preset_identity.filter(|id| !id.trim().is_empty()),
        }
    }
}

impl CredentialProvider for InteractivePrompter {
    fn identity(&self) -> Result<String> {
        if let Some(identity) = &self.preset_identity {
            return Ok(identity.trim().to_string());
        }

        let identity = Text::new("Apple ID (email):")
            .with_validator(|input: &str| {
                if input.trim().is_empty() {
                    Ok(inquire::validator::Validation::Invalid("Identity cannot be empty.".into()))
                } else {
                    Ok(inquire::validator::Validation::Valid)
                }
            })
            .prompt()
            .context("Failed to read identity")?;
        Ok(identity.trim().to_string())
    }

    fn secret(&self, identity: &str) -> Result<String> {
        let secret = Password::new(&format!("Password for {}:", identity))
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .context("Failed to read password")?;
        Ok(secret.trim().to_string())
    }

    fn second_factor_code(&self) -> Result<String> {
        let code = Text::new("Enter 2FA code:")
            .with_help_message("The six-digit code shown on your trusted device")
            .prompt()
            .context("Failed to read 2FA code")?;
        Ok(code.trim().to_string())
    }
}
