//! Master key acquisition and storage.
//!
//! Keys live in one of two places, tried in order:
//! 1. a docker-credential-* helper (`helper`)
//! 2. `<data dir>/secret.key`, written owner-only
//!
//! When neither has a key, the user is prompted and the answer is
//! stored before it is used.

pub mod helper;

use std::fs;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::crypto::MasterKey;
use crate::errors::{EnvBoxError, Result};
use crate::prompt::Prompter;
use crate::vault::format::write_private_file;

pub use helper::{CredentialHelper, DockerCredentialHelper, HelperChoice, SERVICE_URL};

/// File name of the on-disk key inside the data directory.
pub const KEY_FILE_NAME: &str = "secret.key";

/// Where a key was stored or cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyBackend {
    CredentialHelper,
    KeyFile(PathBuf),
}

/// Resolves, persists, and clears the master key.
pub struct KeyStore {
    helper: Box<dyn CredentialHelper>,
    key_path: PathBuf,
}

impl KeyStore {
    /// Build a key store whose file fallback lives in `data_dir`.
    pub fn new(helper: Box<dyn CredentialHelper>, data_dir: &Path) -> Self {
        Self {
            helper,
            key_path: data_dir.join(KEY_FILE_NAME),
        }
    }

    /// Path of the key file fallback.
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Get the master key, trying in order:
    /// 1. the credential helper
    /// 2. the key file (trimmed)
    /// 3. a masked prompt, whose answer is stored before returning
    pub fn acquire_key(&self, prompter: &dyn Prompter) -> Result<MasterKey> {
        match self.helper.get(SERVICE_URL) {
            Ok(Some(material)) => {
                tracing::debug!("master key loaded from credential helper");
                return MasterKey::new(material);
            }
            Ok(None) | Err(EnvBoxError::HelperUnavailable) => {}
            Err(e) => return Err(e),
        }

        if self.key_path.exists() {
            let contents = Zeroizing::new(fs::read_to_string(&self.key_path)?);
            tracing::debug!(path = %self.key_path.display(), "master key loaded from key file");
            return MasterKey::new(contents.trim());
        }

        let entered = prompter.prompt_masked("enter key")?;
        let key = MasterKey::new(entered.trim())?;
        let backend = self.store_key(&key)?;
        tracing::debug!(?backend, "stored newly entered master key");
        Ok(key)
    }

    /// Persist `key`, preferring the credential helper.
    ///
    /// Falls back to the key file only when no helper is available;
    /// any other helper failure is returned as-is.
    pub fn store_key(&self, key: &MasterKey) -> Result<KeyBackend> {
        match self.helper.store(SERVICE_URL, key.as_str()) {
            Ok(()) => Ok(KeyBackend::CredentialHelper),
            Err(EnvBoxError::HelperUnavailable) => {
                write_private_file(&self.key_path, key.as_str().as_bytes())?;
                Ok(KeyBackend::KeyFile(self.key_path.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// Remove the stored key, with the same fallback order as `store_key`.
    ///
    /// A key file that does not exist counts as already cleared.
    pub fn clear_key(&self) -> Result<KeyBackend> {
        match self.helper.erase(SERVICE_URL) {
            Ok(()) => Ok(KeyBackend::CredentialHelper),
            Err(EnvBoxError::HelperUnavailable) => {
                match fs::remove_file(&self.key_path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                Ok(KeyBackend::KeyFile(self.key_path.clone()))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    const KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef";

    /// How the fake helper behaves.
    enum Mode {
        Unavailable,
        Working(RefCell<Option<String>>),
        Broken,
    }

    struct FakeHelper(Mode);

    impl CredentialHelper for FakeHelper {
        fn get(&self, _: &str) -> Result<Option<String>> {
            match &self.0 {
                Mode::Unavailable => Err(EnvBoxError::HelperUnavailable),
                Mode::Working(slot) => Ok(slot.borrow().clone()),
                Mode::Broken => Err(EnvBoxError::CredentialHelper("locked".into())),
            }
        }

        fn store(&self, _: &str, secret: &str) -> Result<()> {
            match &self.0 {
                Mode::Unavailable => Err(EnvBoxError::HelperUnavailable),
                Mode::Working(slot) => {
                    *slot.borrow_mut() = Some(secret.to_string());
                    Ok(())
                }
                Mode::Broken => Err(EnvBoxError::CredentialHelper("locked".into())),
            }
        }

        fn erase(&self, _: &str) -> Result<()> {
            match &self.0 {
                Mode::Unavailable => Err(EnvBoxError::HelperUnavailable),
                Mode::Working(slot) => {
                    *slot.borrow_mut() = None;
                    Ok(())
                }
                Mode::Broken => Err(EnvBoxError::CredentialHelper("locked".into())),
            }
        }
    }

    struct ScriptedPrompter(RefCell<VecDeque<String>>);

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self(RefCell::new(answers.iter().map(|s| s.to_string()).collect()))
        }

        fn next(&self) -> Result<String> {
            self.0
                .borrow_mut()
                .pop_front()
                .ok_or(EnvBoxError::InterruptedPrompt)
        }
    }

    impl Prompter for ScriptedPrompter {
        fn prompt_masked(&self, _: &str) -> Result<Zeroizing<String>> {
            self.next().map(Zeroizing::new)
        }

        fn prompt_for(&self, _: &str) -> Result<String> {
            self.next()
        }
    }

    fn store_with(mode: Mode) -> (TempDir, KeyStore) {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(Box::new(FakeHelper(mode)), dir.path());
        (dir, store)
    }

    #[test]
    fn helper_key_wins_over_key_file() {
        let (_dir, store) = store_with(Mode::Working(RefCell::new(Some(KEY.into()))));
        fs::write(store.key_path(), "f".repeat(40)).unwrap();

        let key = store.acquire_key(&ScriptedPrompter::new(&[])).unwrap();
        assert_eq!(key.as_str(), KEY);
    }

    #[test]
    fn key_file_is_trimmed() {
        let (_dir, store) = store_with(Mode::Unavailable);
        fs::write(store.key_path(), format!("  {KEY}\n")).unwrap();

        let key = store.acquire_key(&ScriptedPrompter::new(&[])).unwrap();
        assert_eq!(key.as_str(), KEY);
    }

    #[test]
    fn empty_helper_falls_through_to_key_file() {
        let (_dir, store) = store_with(Mode::Working(RefCell::new(None)));
        fs::write(store.key_path(), KEY).unwrap();

        let key = store.acquire_key(&ScriptedPrompter::new(&[])).unwrap();
        assert_eq!(key.as_str(), KEY);
    }

    #[test]
    fn prompted_key_is_persisted_to_key_file() {
        let (_dir, store) = store_with(Mode::Unavailable);

        let key = store.acquire_key(&ScriptedPrompter::new(&[KEY])).unwrap();
        assert_eq!(key.as_str(), KEY);
        assert_eq!(fs::read_to_string(store.key_path()).unwrap(), KEY);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(store.key_path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn prompted_key_is_persisted_to_helper_when_available() {
        let (_dir, store) = store_with(Mode::Working(RefCell::new(None)));

        store.acquire_key(&ScriptedPrompter::new(&[KEY])).unwrap();
        assert!(!store.key_path().exists());
        assert_eq!(store.acquire_key(&ScriptedPrompter::new(&[])).unwrap().as_str(), KEY);
    }

    #[test]
    fn short_prompted_key_is_rejected_and_not_stored() {
        let (_dir, store) = store_with(Mode::Unavailable);

        let err = store.acquire_key(&ScriptedPrompter::new(&["short"])).unwrap_err();
        assert!(matches!(err, EnvBoxError::InvalidKey(_)));
        assert!(!store.key_path().exists());
    }

    #[test]
    fn interrupted_prompt_is_surfaced() {
        let (_dir, store) = store_with(Mode::Unavailable);
        let err = store.acquire_key(&ScriptedPrompter::new(&[])).unwrap_err();
        assert!(matches!(err, EnvBoxError::InterruptedPrompt));
    }

    #[test]
    fn broken_helper_error_is_not_masked_by_fallback() {
        let (_dir, store) = store_with(Mode::Broken);
        let key = MasterKey::new(KEY).unwrap();

        assert!(matches!(
            store.store_key(&key),
            Err(EnvBoxError::CredentialHelper(_))
        ));
        assert!(!store.key_path().exists());

        assert!(matches!(
            store.clear_key(),
            Err(EnvBoxError::CredentialHelper(_))
        ));
        assert!(matches!(
            store.acquire_key(&ScriptedPrompter::new(&[KEY])),
            Err(EnvBoxError::CredentialHelper(_))
        ));
    }

    #[test]
    fn store_overwrites_existing_key_file() {
        let (_dir, store) = store_with(Mode::Unavailable);
        fs::write(store.key_path(), "old-key-old-key-old-key-old-key-old").unwrap();

        let key = MasterKey::new(KEY).unwrap();
        assert_eq!(
            store.store_key(&key).unwrap(),
            KeyBackend::KeyFile(store.key_path().to_path_buf())
        );
        assert_eq!(fs::read_to_string(store.key_path()).unwrap(), KEY);
    }

    #[test]
    fn clear_removes_key_file_and_tolerates_missing_file() {
        let (_dir, store) = store_with(Mode::Unavailable);
        fs::write(store.key_path(), KEY).unwrap();

        store.clear_key().unwrap();
        assert!(!store.key_path().exists());
        store.clear_key().unwrap();
    }

    #[test]
    fn clear_with_helper_leaves_key_file_alone() {
        let (_dir, store) = store_with(Mode::Working(RefCell::new(Some(KEY.into()))));
        fs::write(store.key_path(), KEY).unwrap();

        assert_eq!(store.clear_key().unwrap(), KeyBackend::CredentialHelper);
        assert!(store.key_path().exists());
    }
}
