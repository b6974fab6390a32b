//! `envbox completions` — generate shell completion scripts.
//!
//! Usage:
//!   envbox completions bash > ~/.local/share/bash-completion/completions/envbox
//!   envbox completions zsh > "${fpath[1]}/_envbox"
//!   envbox completions fish > ~/.config/fish/completions/envbox.fish

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    write_completions(shell, &mut io::stdout())
}

fn write_completions<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_completions(shell, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn bash_script_covers_subcommands() {
        let out = script(Shell::Bash);
        assert!(out.contains("envbox"));
        for sub in ["add", "list", "show", "remove", "run", "key"] {
            assert!(out.contains(sub), "missing {sub}");
        }
    }

    #[test]
    fn every_shell_produces_output() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
            assert!(!script(shell).is_empty());
        }
    }
}
