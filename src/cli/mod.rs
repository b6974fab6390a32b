//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::errors::Result;
use crate::service::VaultService;

/// Environment variable holding an explicit log filter (EnvFilter syntax).
pub const LOG_ENV_VAR: &str = "ENVBOX_LOG";

/// envbox: encrypted environment variables, injected on demand.
#[derive(Parser)]
#[command(
    name = "envbox",
    about = "Secure storage and injection of environment variables",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print debug diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Add an environment variable
    #[command(visible_alias = "a")]
    Add {
        /// Name of the secret
        #[arg(short, long)]
        name: String,

        /// Name of the exposed variable, if different than the name
        #[arg(short, long)]
        exposed: Option<String>,

        /// File with the contents of the variable
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Keep prompting for additional variables (empty name to finish)
        #[arg(short, long)]
        multi: bool,
    },

    /// List environment variables
    #[command(visible_alias = "ls")]
    List {
        /// Print every value as name(EXPOSED)=value
        #[arg(long)]
        values: bool,
    },

    /// Show an environment variable
    Show {
        /// Name of the secret
        #[arg(short, long)]
        name: String,

        /// Format for shell eval instead of human reading
        #[arg(short, long)]
        export: bool,
    },

    /// Remove an environment variable
    #[command(visible_alias = "rm")]
    Remove {
        /// Name of the secret
        #[arg(short, long)]
        name: String,
    },

    /// Run a command with secrets injected
    #[command(visible_alias = "r")]
    Run {
        /// Secrets to expose (repeatable)
        #[arg(short, long = "env", required = true)]
        env: Vec<String>,

        /// Wrap execution in a call to `<shell> -c`
        #[arg(short, long)]
        shell: bool,

        /// Command and arguments (after --)
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Manage the master key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Key subcommands.
#[derive(clap::Subcommand)]
pub enum KeyAction {
    /// Generate a new random key
    #[command(visible_alias = "gen")]
    Generate {
        /// Also store it as the current key
        #[arg(short, long)]
        set: bool,
    },

    /// Prompt for a key and store it
    Set,

    /// Remove the stored key
    Clear,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// The default log filter for the given global flags.
pub fn default_log_filter(quiet: bool, verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Install the stderr tracing subscriber.
///
/// `ENVBOX_LOG` wins over the `-q`/`-v` flags when set.
pub fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(cli.quiet, cli.verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// Open the vault service for the current user.
pub fn open_service() -> Result<VaultService> {
    VaultService::from_process_env()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_filter_follows_flags() {
        assert_eq!(default_log_filter(false, false), "warn");
        assert_eq!(default_log_filter(true, false), "error");
        assert_eq!(default_log_filter(false, true), "debug");
    }

    #[test]
    fn run_collects_repeated_env_and_trailing_command() {
        let cli = Cli::try_parse_from([
            "envbox", "run", "-e", "api", "--env", "db", "-s", "--", "echo", "-n", "$API_KEY",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { env, shell, command } => {
                assert_eq!(env, vec!["api", "db"]);
                assert!(shell);
                assert_eq!(command, vec!["echo", "-n", "$API_KEY"]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_requires_env() {
        assert!(Cli::try_parse_from(["envbox", "run", "--", "env"]).is_err());
    }

    #[test]
    fn aliases_resolve() {
        let cli = Cli::try_parse_from(["envbox", "ls"]).unwrap();
        assert!(matches!(cli.command, Commands::List { values: false }));

        let cli = Cli::try_parse_from(["envbox", "rm", "-n", "x"]).unwrap();
        assert!(matches!(cli.command, Commands::Remove { .. }));

        let cli = Cli::try_parse_from(["envbox", "key", "gen", "-s"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Key {
                action: KeyAction::Generate { set: true }
            }
        ));
    }

    #[test]
    fn completions_shell_must_be_known() {
        let cli = Cli::try_parse_from(["envbox", "completions", "zsh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions {
                shell: clap_complete::Shell::Zsh
            }
        ));
        assert!(Cli::try_parse_from(["envbox", "completions", "csh"]).is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["envbox", "-q", "-v", "list"]).is_err());
    }
}
