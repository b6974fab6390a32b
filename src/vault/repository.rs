//! Record storage on disk.
//!
//! `RecordRepository` owns the vault directory.  It never caches: every
//! `list_all` rescans the directory and opens each vault file with the
//! caller's key, so the result always reflects what is on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::crypto::MasterKey;
use crate::errors::Result;

use super::codec::{open, seal};
use super::format::{create_private_file, is_vault_file, random_file_name};
use super::record::SecretRecord;

/// Record name -> decrypted record.
pub type VaultIndex = BTreeMap<String, SecretRecord>;

/// How many random names to try before giving up on `add`.
const MAX_NAME_ATTEMPTS: usize = 8;

/// Handle to a vault directory.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    dir: PathBuf,
}

impl RecordRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The vault directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decrypt every vault file readable with `key` and index it by name.
    ///
    /// Files that cannot be read, fail authentication (another key), or
    /// hold a malformed payload are skipped, never reported as errors.
    /// If two files decrypt to the same name, the one scanned last wins.
    /// A missing directory is an empty vault.
    pub fn list_all(&self, key: &MasterKey) -> Result<VaultIndex> {
        let mut index = VaultIndex::new();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(index),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            if !is_vault_file(&path) || !path.is_file() {
                continue;
            }

            let blob = match fs::read(&path) {
                Ok(blob) => blob,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable vault file");
                    continue;
                }
            };

            match open(key, &blob) {
                Ok(mut record) => {
                    record.storage_location = Some(path);
                    if let Some(previous) = index.insert(record.name.clone(), record) {
                        tracing::debug!(
                            name = %previous.name,
                            "duplicate record name, keeping the last one scanned"
                        );
                    }
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping vault file");
                }
            }
        }

        Ok(index)
    }

    /// Seal `record` into a new, randomly named vault file.
    ///
    /// Does not check for duplicate names; that is the caller's job.
    /// Returns the path of the new file.
    pub fn add(&self, key: &MasterKey, record: &SecretRecord) -> Result<PathBuf> {
        let blob = seal(key, record)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(random_file_name());
            match create_private_file(&path, &blob) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "wrote vault file");
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "could not find an unused vault file name",
        )
        .into())
    }

    /// Delete the vault file backing `name`.
    ///
    /// Resolves the record through `list_all` first, so only a record
    /// readable with `key` can be removed.  Returns `false` if no such
    /// record exists.
    pub fn remove(&self, key: &MasterKey, name: &str) -> Result<bool> {
        let index = self.list_all(key)?;
        let Some(location) = index.get(name).and_then(|r| r.storage_location.as_deref()) else {
            return Ok(false);
        };

        fs::remove_file(location)?;
        tracing::debug!(path = %location.display(), "removed vault file");
        Ok(true)
    }
}
