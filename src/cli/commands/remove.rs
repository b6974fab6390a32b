//! `envbox remove` — delete a secret from the vault.

use crate::cli::{open_service, output};
use crate::errors::Result;

/// Execute the `remove` command.
pub fn execute(name: &str) -> Result<()> {
    let service = open_service()?;
    service.remove_secret(name)?;

    output::success(&format!("Removed '{name}'"));

    Ok(())
}
