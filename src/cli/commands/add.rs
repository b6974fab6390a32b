//! `envbox add` — encrypt a new secret into the vault.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use crate::cli::{open_service, output};
use crate::errors::Result;
use crate::service::ValueSource;

/// Execute the `add` command.
pub fn execute(name: &str, exposed: Option<&str>, file: Option<&Path>, multi: bool) -> Result<()> {
    let service = open_service()?;

    // Determine where the value comes from.
    let source = if let Some(path) = file {
        // Source 1: a file, trimmed.
        ValueSource::File(path.to_path_buf())
    } else if !multi && !io::stdin().is_terminal() {
        // Source 2: piped input (stdin is not a terminal).
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        ValueSource::Literal(buf.trim().to_string())
    } else {
        // Source 3: interactive prompt (default).
        ValueSource::Prompt
    };

    let record = service.add_secret(name, exposed, source, multi)?;

    let vars: Vec<&str> = record.exposed_names().collect();
    output::success(&format!("Added '{}' ({})", record.name, vars.join(", ")));
    output::tip(&format!("Use it: envbox run -e {} -- <command>", record.name));

    Ok(())
}
