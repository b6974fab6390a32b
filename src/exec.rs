//! Handing control to the requested command.
//!
//! On Unix the current process image is replaced, so the child's exit
//! status becomes ours directly.  Elsewhere the child is spawned and
//! waited for, and a non-zero exit is reported as `ChildProcessFailed`.

use std::process::Command;

use crate::environment::EnvVar;
use crate::errors::{EnvBoxError, Result};

/// Runs a program with a fully specified environment.
pub trait Executor {
    /// Run `program` with `args` and exactly the variables in `env`.
    /// On Unix a successful call does not return.
    fn exec(&self, program: &str, args: &[String], env: &[EnvVar]) -> Result<()>;
}

/// The real executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

fn build_command(program: &str, args: &[String], env: &[EnvVar]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .env_clear()
        .envs(env.iter().map(|(key, value)| (key, value)));
    cmd
}

impl Executor for ProcessExecutor {
    #[cfg(unix)]
    fn exec(&self, program: &str, args: &[String], env: &[EnvVar]) -> Result<()> {
        use std::os::unix::process::CommandExt;

        tracing::debug!(program, "exec");
        // `exec` only returns on failure.
        let err = build_command(program, args, env).exec();
        Err(EnvBoxError::CommandFailed(format!("{program}: {err}")))
    }

    #[cfg(not(unix))]
    fn exec(&self, program: &str, args: &[String], env: &[EnvVar]) -> Result<()> {
        tracing::debug!(program, "spawn");
        let status = build_command(program, args, env)
            .status()
            .map_err(|e| EnvBoxError::CommandFailed(format!("{program}: {e}")))?;

        // Forward the child's exit code.
        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(EnvBoxError::ChildProcessFailed(code)),
            None => Err(EnvBoxError::CommandFailed(
                "child process terminated by signal".into(),
            )),
        }
    }
}
