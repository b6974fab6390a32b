//! `envbox list` — display all secrets.

use crate::cli::{open_service, output};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(values: bool) -> Result<()> {
    let service = open_service()?;

    if values {
        for line in service.list_secret_values()? {
            println!("{line}");
        }
        return Ok(());
    }

    let secrets = service.list_secrets()?;
    output::print_secrets_table(&secrets);

    Ok(())
}
