//! Vault file naming and owner-only writes.
//!
//! A vault directory holds one file per record:
//!
//! ```text
//! <data dir>/<48 hex chars>.envenc   [24-byte nonce][secretbox]
//! ```
//!
//! The file name is 24 random bytes, hex-encoded.  It says nothing
//! about the record inside, so listing the directory does not reveal
//! which secrets exist.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rand::RngCore;

use crate::errors::Result;

/// Extension of every vault file.
pub const VAULT_FILE_EXTENSION: &str = "envenc";

/// Random bytes in a vault file name (before hex encoding).
pub const FILE_NAME_BYTES: usize = 24;

/// Generate a fresh random vault file name, e.g. `3fa9…e1.envenc`.
pub fn random_file_name() -> String {
    let mut bytes = [0u8; FILE_NAME_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}.{VAULT_FILE_EXTENSION}", hex::encode(bytes))
}

/// Returns `true` if `path` names a vault file (by extension).
pub fn is_vault_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == VAULT_FILE_EXTENSION)
}

/// Write `bytes` to `path`, readable and writable by the owner only.
///
/// Replaces any existing file and tightens its permissions.
pub fn write_private_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    restrict_mode(&mut options);

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    set_private_permissions(path)?;
    Ok(())
}

/// Write `bytes` to a new file at `path`, failing with
/// `AlreadyExists` if anything is already there.
pub fn create_private_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    restrict_mode(&mut options);

    let mut file = options.open(path)?;
    file.write_all(bytes)
}

#[cfg(unix)]
fn restrict_mode(options: &mut fs::OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
}

#[cfg(not(unix))]
fn restrict_mode(_options: &mut fs::OpenOptions) {}

#[cfg(unix)]
fn set_private_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_private_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn random_file_name_shape() {
        let name = random_file_name();
        let (stem, ext) = name.split_once('.').unwrap();
        assert_eq!(ext, "envenc");
        assert_eq!(stem.len(), FILE_NAME_BYTES * 2);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(name, random_file_name());
    }

    #[test]
    fn is_vault_file_checks_extension() {
        assert!(is_vault_file(Path::new("/tmp/abc.envenc")));
        assert!(!is_vault_file(Path::new("/tmp/secret.key")));
        assert!(!is_vault_file(Path::new("/tmp/envenc")));
    }

    #[test]
    fn create_private_file_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.envenc");
        create_private_file(&path, b"one").unwrap();

        let err = create_private_file(&path, b"two").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&path).unwrap(), b"one");
    }

    #[cfg(unix)]
    #[test]
    fn write_private_file_tightens_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.key");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_private_file(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
