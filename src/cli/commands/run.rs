//! `envbox run` — inject secrets into a child process.
//!
//! On Unix the child replaces this process, so nothing after the exec
//! runs; warnings about missing names are printed first.

use crate::cli::{open_service, output};
use crate::errors::Result;

/// Execute the `run` command.
pub fn execute(names: &[String], shell: bool, command: &[String]) -> Result<()> {
    let service = open_service()?;
    let plan = service.prepare_run(names, shell, command)?;

    for name in &plan.missing {
        output::warning(&format!("unable to find {name}"));
    }

    service.execute(&plan)
}
