//! `envbox show` — print one secret, for humans or for `eval`.

use crate::cli::open_service;
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(name: &str, export: bool) -> Result<()> {
    let service = open_service()?;

    let lines = if export {
        service.export_secret(name)?
    } else {
        service.show_secret(name)?
    };

    for line in lines {
        println!("{line}");
    }

    Ok(())
}
