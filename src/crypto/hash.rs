//! Hashing utilities
//!
//! SHA-256 helpers and the address derivation used for vaults, factories
//! and tokens.

use crate::core::Address;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Derive a contract address from a namespace, its creator and a nonce
///
/// Address = "0x" || first 20 bytes of SHA256("{namespace}:{creator}:{nonce}"), hex encoded
pub fn derive_address(namespace: &str, creator: &str, nonce: u64) -> Address {
    let input = format!("{}:{}:{}", namespace, creator, nonce);
    let hex = sha256_hex(input.as_bytes());
    Address::new(format!("0x{}", &hex[..40]))
}
