//! The master key and random key generation.
//!
//! The master key is whatever text the user stored (a generated hex
//! string, or a passphrase they typed).  Only its first 32 bytes feed
//! the cipher, so anything shorter is rejected up front instead of
//! being padded.

use std::fmt;

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{EnvBoxError, Result};

/// Minimum key material length in bytes (one XSalsa20 key).
pub const MIN_KEY_LEN: usize = 32;

/// Number of random bytes drawn by `generate_key_material`.
const GENERATED_KEY_BYTES: usize = 32;

/// A wrapper around the key material that zeroes its memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    material: String,
}

impl MasterKey {
    /// Wrap key material, rejecting anything shorter than 32 bytes.
    pub fn new(material: impl Into<String>) -> Result<Self> {
        let material = material.into();
        if material.len() < MIN_KEY_LEN {
            let len = material.len();
            // Drop through zeroize so the rejected input does not linger.
            let _ = Zeroizing::new(material);
            return Err(EnvBoxError::InvalidKey(format!(
                "key must be at least {MIN_KEY_LEN} bytes, got {len}"
            )));
        }
        Ok(Self { material })
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self {
            material: generate_key_material(),
        }
    }

    /// The full key material, as stored by the key store.
    pub fn as_str(&self) -> &str {
        &self.material
    }

    /// The 32-byte cipher key: exactly the first 32 bytes of the material.
    pub fn cipher_key(&self) -> Zeroizing<[u8; 32]> {
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&self.material.as_bytes()[..MIN_KEY_LEN]);
        key
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Draw 32 random bytes and hex-encode them (64 characters).
pub fn generate_key_material() -> String {
    let mut bytes = Zeroizing::new([0u8; GENERATED_KEY_BYTES]);
    rand::rng().fill_bytes(&mut *bytes);
    hex::encode(&*bytes)
}
