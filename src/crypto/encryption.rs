//! XSalsa20-Poly1305 authenticated encryption (NaCl secretbox).
//!
//! Each call to `encrypt` generates a fresh random 24-byte nonce and
//! prepends it to the sealed box.  `decrypt` splits the nonce back out
//! before opening.
//!
//! Layout of the returned byte buffer:
//!   [ 24-byte nonce | 16-byte Poly1305 tag + ciphertext ]
//!
//! This is the same layout `secretbox.Seal` produces when the output
//! buffer starts with the nonce, so vault files written by other NaCl
//! tools open here unchanged.

use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Key, Nonce, XSalsa20Poly1305};
use rand::RngCore;

use crate::errors::{EnvBoxError, Result};

/// Size of the XSalsa20 nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns the nonce prepended to the sealed box (nonce || tag || ciphertext).
pub fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));

    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| EnvBoxError::EncryptionFailed(format!("secretbox seal: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + sealed.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&sealed);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt`.
///
/// Any failure (short input, bad tag, wrong key) is reported as
/// `DecryptionFailed` so callers can treat the blob as unreadable.
pub fn decrypt(key: &[u8; 32], sealed_with_nonce: &[u8]) -> Result<Vec<u8>> {
    if sealed_with_nonce.len() < NONCE_LEN + TAG_LEN {
        return Err(EnvBoxError::DecryptionFailed);
    }

    let (nonce_bytes, sealed) = sealed_with_nonce.split_at(NONCE_LEN);
    let cipher = XSalsa20Poly1305::new(Key::from_slice(key));

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), sealed)
        .map_err(|_| EnvBoxError::DecryptionFailed)
}
