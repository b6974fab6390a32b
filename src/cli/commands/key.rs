//! `envbox key` — generate, set, or clear the master key.
//!
//! Subcommands:
//! - `envbox key generate`        — print a fresh random key
//! - `envbox key generate --set`  — print it and store it (status on stderr)
//! - `envbox key set`             — prompt for a key and store it
//! - `envbox key clear`           — remove the stored key

use crate::cli::{open_service, output};
use crate::errors::Result;
use crate::keystore::KeyBackend;

fn describe(backend: &KeyBackend) -> String {
    match backend {
        KeyBackend::CredentialHelper => "credential helper".to_string(),
        KeyBackend::KeyFile(path) => path.display().to_string(),
    }
}

/// Execute `envbox key generate`.
pub fn execute_generate(set: bool) -> Result<()> {
    let service = open_service()?;
    let (key, backend) = service.generate_key(set)?;

    // Bare, so it can be captured by scripts.
    println!("{}", key.as_str());

    if let Some(backend) = backend {
        output::success_to_stderr(&format!("Key stored in {}", describe(&backend)));
    }

    Ok(())
}

/// Execute `envbox key set`.
pub fn execute_set() -> Result<()> {
    let service = open_service()?;
    let backend = service.set_key_interactive()?;

    output::success(&format!("Key stored in {}", describe(&backend)));

    Ok(())
}

/// Execute `envbox key clear`.
pub fn execute_clear() -> Result<()> {
    let service = open_service()?;
    let backend = service.clear_key()?;

    output::success(&format!("Key cleared from {}", describe(&backend)));

    Ok(())
}
