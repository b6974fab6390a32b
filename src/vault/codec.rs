//! Sealing and opening a single record.
//!
//! `seal` serializes a record to JSON and encrypts it with the first 32
//! bytes of the master key; `open` reverses it.  The plaintext JSON is
//! zeroized as soon as it is no longer needed.

use zeroize::Zeroizing;

use crate::crypto::{decrypt, encrypt, MasterKey};
use crate::errors::Result;

use super::record::{RecordPayload, SecretRecord};

/// Encrypt `record` into an opaque vault blob (nonce || sealed box).
///
/// Every call draws a fresh nonce, so sealing the same record twice
/// never produces the same bytes.
pub fn seal(key: &MasterKey, record: &SecretRecord) -> Result<Vec<u8>> {
    let plaintext = Zeroizing::new(serde_json::to_vec(&RecordPayload::from_record(record))?);
    encrypt(&key.cipher_key(), &plaintext)
}

/// Decrypt a vault blob back into a record.
///
/// Returns `DecryptionFailed` for a wrong key or tampered blob, and a
/// serialization or `InvalidRecord` error for a payload that decrypts
/// but is not a record.  Legacy payloads come back normalized.
pub fn open(key: &MasterKey, blob: &[u8]) -> Result<SecretRecord> {
    let plaintext = Zeroizing::new(decrypt(&key.cipher_key(), blob)?);
    let payload: RecordPayload = serde_json::from_slice(&plaintext)?;
    payload.into_record()
}
