//! Vault module — one encrypted file per secret record.
//!
//! This module provides:
//! - `SecretRecord` and legacy payload normalization (`record`)
//! - Sealing and opening a record with the master key (`codec`)
//! - Vault file naming and owner-only writes (`format`)
//! - `RecordRepository` for scanning, adding, and removing records (`repository`)

pub mod codec;
pub mod format;
pub mod record;
pub mod repository;

// Re-export the most commonly used items.
pub use codec::{open, seal};
pub use record::SecretRecord;
pub use repository::{RecordRepository, VaultIndex};
