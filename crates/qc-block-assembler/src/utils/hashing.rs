//! Hashing utilities for block assembly
//!
//! Both the Merkle aggregation and the proof-of-work search use the same
//! double SHA-256 over UTF-8 text. The first digest's raw bytes feed the
//! second digest; only the final digest is hex encoded.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of data
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute double SHA-256 hash (Bitcoin-style)
#[inline]
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first_hash = sha256(data);
    sha256(&first_hash)
}

/// Double SHA-256 of a text value, lowercase hex encoded
pub fn sha256d_hex(text: &str) -> String {
    hex::encode(sha256d(text.as_bytes()))
}
