use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{EnvBoxError, Result};
use crate::keystore::HelperChoice;

/// Directory name used under the XDG data home.
pub const APP_DIR_NAME: &str = "envbox";

/// Resolve the storage directory from an environment lookup.
///
/// `$XDG_DATA_HOME/envbox` wins when set; otherwise
/// `$HOME/.local/share/envbox`.  Neither being set is fatal.
/// Empty values count as unset.
pub fn data_dir<F>(lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(xdg) = non_empty("XDG_DATA_HOME") {
        return Ok(PathBuf::from(xdg).join(APP_DIR_NAME));
    }

    match non_empty("HOME") {
        Some(home) => Ok(PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR_NAME)),
        None => Err(EnvBoxError::ConfigError(
            "neither $XDG_DATA_HOME nor $HOME is set".into(),
        )),
    }
}

/// Create the storage directory (and parents) if it does not exist yet.
///
/// New directories are created owner-only on Unix.
pub fn ensure_data_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder.create(path)?;
    tracing::debug!(path = %path.display(), "created data directory");
    Ok(())
}

/// User configuration, loaded from `<data dir>/config.toml`.
///
/// Every field has a default so envbox works without any config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Which credential helper to use: "auto", "none", or a
    /// `docker-credential-<name>` suffix such as "pass".
    #[serde(default = "default_credential_helper")]
    pub credential_helper: String,

    /// Shell used by `run --shell`.
    #[serde(default = "default_shell")]
    pub shell: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_credential_helper() -> String {
    "auto".to_string()
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            credential_helper: default_credential_helper(),
            shell: default_shell(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the data directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load settings from `<data_dir>/config.toml`.
    ///
    /// A missing file yields defaults; an unparsable one is an error.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        toml::from_str(&contents).map_err(|e| {
            EnvBoxError::ConfigError(format!("failed to parse {}: {e}", config_path.display()))
        })
    }

    /// The credential helper selection this config asks for.
    pub fn helper_choice(&self) -> HelperChoice {
        HelperChoice::parse(&self.credential_helper)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
