//! docker-credential-* helper integration for key caching.
//!
//! Stores and retrieves the master key through whichever
//! `docker-credential-<backend>` program is on `PATH`:
//! - `cachemem` (in-memory cache) when present
//! - otherwise the platform helper: `secretservice` (Linux),
//!   `osxkeychain` (macOS) or `wincred` (Windows)
//!
//! The helpers speak a tiny stdin/stdout protocol: `store` reads a JSON
//! credential, `get` and `erase` read the server URL.  A failing helper
//! exits non-zero with its message on stdout.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::errors::{EnvBoxError, Result};

/// Identifier under which the key is stored in the helper.
pub const SERVICE_URL: &str = "https://github.com/justone/envbox";

/// Username recorded alongside the key.
const USERNAME: &str = "key";

/// Prefix of every credential helper binary.
pub const PROGRAM_PREFIX: &str = "docker-credential-";

/// Message helpers print when no entry exists for a server URL.
const CREDENTIALS_NOT_FOUND: &str = "credentials not found in native keychain";

/// A place the master key can be cached outside of plain files.
///
/// `HelperUnavailable` means "no helper on this system" and lets the
/// key store fall back to its key file; any other error is real.
pub trait CredentialHelper {
    /// Fetch the secret for `server_url`, `None` if nothing is stored.
    fn get(&self, server_url: &str) -> Result<Option<String>>;

    /// Store `secret` for `server_url`, replacing any previous value.
    fn store(&self, server_url: &str, secret: &str) -> Result<()>;

    /// Remove the entry for `server_url`.  Missing entries are not an error.
    fn erase(&self, server_url: &str) -> Result<()>;
}

/// Which helper the user asked for in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperChoice {
    /// `cachemem` if installed, else the platform's stock helper.
    Auto,
    /// Never use a helper; the key file is the only backend.
    Disabled,
    /// A specific `docker-credential-<name>` program.
    Named(String),
}

impl HelperChoice {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "auto" => Self::Auto,
            "none" | "off" | "disabled" => Self::Disabled,
            other => Self::Named(other.to_string()),
        }
    }
}

/// Build a helper program name from its backend suffix.
pub fn program_name(backend: &str) -> String {
    format!("{PROGRAM_PREFIX}{backend}")
}

/// Pick the helper program for `choice` on platform `os`
/// (as in `std::env::consts::OS`).
///
/// `exists` answers whether a program is on the search path; the real
/// caller passes a `which` lookup, tests pass a fixed set.
pub fn select_helper<F>(choice: &HelperChoice, os: &str, exists: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let found = |backend: &str| {
        let program = program_name(backend);
        exists(&program).then_some(program)
    };

    match choice {
        HelperChoice::Disabled => None,
        HelperChoice::Named(backend) => found(backend),
        HelperChoice::Auto => found("cachemem").or_else(|| {
            let stock = match os {
                "linux" => "secretservice",
                "macos" => "osxkeychain",
                "windows" => "wincred",
                _ => return None,
            };
            found(stock)
        }),
    }
}

/// Wire format shared by every docker credential helper.
#[derive(Debug, Serialize, Deserialize)]
struct Credentials {
    #[serde(rename = "ServerURL")]
    server_url: String,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Secret")]
    secret: String,
}

/// A `CredentialHelper` that shells out to a docker-credential-* program.
#[derive(Debug, Clone)]
pub struct DockerCredentialHelper {
    program: Option<PathBuf>,
}

impl DockerCredentialHelper {
    /// Locate the helper for `choice` on `PATH`.
    ///
    /// Finding nothing is not an error: every call then reports
    /// `HelperUnavailable`.
    pub fn discover(choice: &HelperChoice) -> Self {
        let program = select_helper(choice, std::env::consts::OS, |name| {
            which::which(name).is_ok()
        })
        .and_then(|name| which::which(name).ok());

        match &program {
            Some(path) => tracing::debug!(helper = %path.display(), "using credential helper"),
            None => tracing::debug!(?choice, "no credential helper found"),
        }

        Self { program }
    }

    /// Use an explicit helper program.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    /// A helper that is never available.
    pub fn unavailable() -> Self {
        Self { program: None }
    }

    /// The resolved helper program, if any.
    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }

    /// Run `<program> <action>` with `input` on stdin and return stdout.
    fn invoke(&self, action: &str, input: &[u8]) -> Result<Vec<u8>> {
        let program = self.program().ok_or(EnvBoxError::HelperUnavailable)?;

        let mut child = match Command::new(program)
            .arg(action)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EnvBoxError::HelperUnavailable);
            }
            Err(e) => {
                return Err(EnvBoxError::CredentialHelper(format!(
                    "failed to start {}: {e}",
                    program.display()
                )));
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            // The helper may exit before reading everything it was sent.
            match stdin.write_all(input) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(EnvBoxError::Io(e)),
            }
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            return Ok(output.stdout);
        }

        let mut message = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if message.is_empty() {
            message = String::from_utf8_lossy(&output.stderr).trim().to_string();
        }
        if message.is_empty() {
            message = format!("{action} exited with {}", output.status);
        }
        Err(EnvBoxError::CredentialHelper(message))
    }
}

fn is_not_found(err: &EnvBoxError) -> bool {
    matches!(err, EnvBoxError::CredentialHelper(msg) if msg == CREDENTIALS_NOT_FOUND)
}

impl CredentialHelper for DockerCredentialHelper {
    fn get(&self, server_url: &str) -> Result<Option<String>> {
        let stdout = match self.invoke("get", server_url.as_bytes()) {
            Ok(stdout) => stdout,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(e),
        };

        let creds: Credentials = serde_json::from_slice(&stdout).map_err(|e| {
            EnvBoxError::CredentialHelper(format!("unreadable helper response: {e}"))
        })?;

        Ok(Some(creds.secret).filter(|s| !s.is_empty()))
    }

    fn store(&self, server_url: &str, secret: &str) -> Result<()> {
        let creds = Credentials {
            server_url: server_url.to_string(),
            username: USERNAME.to_string(),
            secret: secret.to_string(),
        };
        let payload = zeroize::Zeroizing::new(serde_json::to_vec(&creds)?);
        self.invoke("store", &payload)?;
        Ok(())
    }

    fn erase(&self, server_url: &str) -> Result<()> {
        match self.invoke("erase", server_url.as_bytes()) {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()), // Already gone, that's fine.
            Err(e) => Err(e),
        }
    }
}
