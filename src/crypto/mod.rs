//! Cryptographic primitives for envbox.
//!
//! This module provides:
//! - XSalsa20-Poly1305 (NaCl secretbox) sealing and opening (`encryption`)
//! - The zeroizing `MasterKey` and random key generation (`keys`)

pub mod encryption;
pub mod keys;

pub use encryption::{decrypt, encrypt, NONCE_LEN};
pub use keys::{generate_key_material, MasterKey, MIN_KEY_LEN};
