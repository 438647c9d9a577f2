//! Merkle aggregation over transaction identifiers
//!
//! ## Algorithm
//!
//! 1. No identifiers: the root is the empty string
//! 2. One identifier: the root is that identifier, unhashed
//! 3. Otherwise, per level: duplicate the last element of an odd level,
//!    then parent = sha256d_hex(left || right), where `||` joins the two hex
//!    strings as text (they are not decoded to bytes first)
//! 4. Repeat until one digest remains
//!
//! Step 2 differs from the usual construction, where a lone leaf would still
//! be hashed. It is kept as is.

use crate::utils::hashing::sha256d_hex;

/// Reduces an ordered identifier sequence to one root digest
pub struct MerkleTreeBuilder;

impl MerkleTreeBuilder {
    /// Root of `identifiers`, order-sensitive
    pub fn root<S: AsRef<str>>(identifiers: &[S]) -> String {
        match identifiers {
            [] => String::new(),
            [single] => single.as_ref().to_string(),
            _ => {
                let mut level: Vec<String> =
                    identifiers.iter().map(|id| id.as_ref().to_string()).collect();
                while level.len() > 1 {
                    level = Self::next_level(level);
                }
                level.pop().unwrap_or_default()
            }
        }
    }

    /// Every level of the reduction, leaves first and `[root]` last.
    ///
    /// Leaves are reported as given, before any odd-length duplication.
    pub fn levels<S: AsRef<str>>(identifiers: &[S]) -> Vec<Vec<String>> {
        let mut level: Vec<String> = identifiers
            .iter()
            .map(|id| id.as_ref().to_string())
            .collect();
        if level.is_empty() {
            return Vec::new();
        }

        let mut levels = vec![level.clone()];
        while level.len() > 1 {
            level = Self::next_level(level);
            levels.push(level.clone());
        }
        levels
    }

    /// Parent digest of two sibling hex strings
    pub fn hash_pair(left: &str, right: &str) -> String {
        let mut combined = String::with_capacity(left.len() + right.len());
        combined.push_str(left);
        combined.push_str(right);
        sha256d_hex(&combined)
    }

    fn next_level(mut level: Vec<String>) -> Vec<String> {
        if level.len() % 2 != 0 {
            if let Some(last) = level.last().cloned() {
                level.push(last);
            }
        }

        level
            .chunks_exact(2)
            .map(|pair| Self::hash_pair(&pair[0], &pair[1]))
            .collect()
    }
}
