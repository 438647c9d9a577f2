//! Utility modules for block assembly

pub mod hashing;

pub use hashing::{sha256, sha256d, sha256d_hex};
