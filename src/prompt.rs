//! Interactive input.
//!
//! Everything that asks the user for text goes through `Prompter`, so
//! the vault service can be driven by a scripted prompter in tests.

use std::io;

use zeroize::Zeroizing;

use crate::errors::{EnvBoxError, Result};

pub trait Prompter {
    /// Read a line without echoing it (keys, secret values).
    fn prompt_masked(&self, prompt: &str) -> Result<Zeroizing<String>>;

    /// Read a visible line, trimmed of surrounding whitespace.
    fn prompt_for(&self, prompt: &str) -> Result<String>;
}

/// Prompts on the controlling terminal via `dialoguer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt_masked(&self, prompt: &str) -> Result<Zeroizing<String>> {
        let value = dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_error)?;
        Ok(Zeroizing::new(value))
    }

    fn prompt_for(&self, prompt: &str) -> Result<String> {
        let value: String = dialoguer::Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        Ok(value.trim().to_string())
    }
}

/// Map a dialoguer failure, keeping Ctrl-C distinct from real I/O errors.
fn prompt_error(err: dialoguer::Error) -> EnvBoxError {
    match err {
        dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => {
            EnvBoxError::InterruptedPrompt
        }
        dialoguer::Error::IO(e) => EnvBoxError::PromptFailed(e),
    }
}
