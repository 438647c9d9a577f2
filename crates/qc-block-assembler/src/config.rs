//! Configuration types for block assembly
//!
//! Chain constants are fixed for a run: they are read once at start-up and
//! handed to [`crate::BlockAssembler`] as an immutable value.

use crate::domain::{validate_digest_hex, DifficultyTarget};
use crate::error::{AssemblyError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Runtime configuration for block assembly
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Fixed chain constants
    pub chain: ChainParams,

    /// Nonce search settings
    pub miner: MinerConfig,
}

/// Fixed chain constants (version, previous hash, target, reward shape)
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    /// Protocol version written into the header
    pub version: u32,

    /// Previous block digest (64 lowercase hex chars)
    pub prev_block_hash: String,

    /// Difficulty target (64 lowercase hex chars)
    pub difficulty_target: String,

    /// Identifier of the reward transaction
    pub reward_txid: String,

    /// Locking script of the reward output
    pub reward_scriptpubkey: String,

    /// Block subsidy paid by the reward output
    pub block_subsidy: u64,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            version: crate::DEFAULT_VERSION,
            prev_block_hash: crate::DEFAULT_PREV_BLOCK_HASH.to_string(),
            difficulty_target: crate::DEFAULT_DIFFICULTY_TARGET.to_string(),
            reward_txid: crate::REWARD_TXID.to_string(),
            reward_scriptpubkey: crate::DEFAULT_REWARD_SCRIPTPUBKEY.to_string(),
            block_subsidy: crate::DEFAULT_BLOCK_SUBSIDY,
        }
    }
}

/// PoW search configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Number of worker threads (1 = sequential scan)
    pub threads: usize,

    /// Highest nonce to try (inclusive). `None` searches without bound and
    /// never returns if no nonce satisfies the target.
    pub max_nonce: Option<u64>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            max_nonce: None,
        }
    }
}

impl AssemblyConfig {
    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        info!("Loaded assembly config from {}", path.display());
        Ok(config)
    }

    /// Override settings from `QC_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary key lookup
    pub(crate) fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(target) = lookup("QC_DIFFICULTY_TARGET") {
            self.chain.difficulty_target = target;
        }
        if let Some(prev) = lookup("QC_PREV_BLOCK_HASH") {
            self.chain.prev_block_hash = prev;
        }
        if let Some(threads) = lookup("QC_MINER_THREADS") {
            match threads.parse::<usize>() {
                Ok(0) => self.miner.threads = num_cpus::get(),
                Ok(n) => self.miner.threads = n,
                Err(_) => warn!("QC_MINER_THREADS must be an integer, got {:?}", threads),
            }
        }
        if let Some(max_nonce) = lookup("QC_MAX_NONCE") {
            match max_nonce.parse::<u64>() {
                Ok(n) => self.miner.max_nonce = Some(n),
                Err(_) => warn!("QC_MAX_NONCE must be an integer, got {:?}", max_nonce),
            }
        }
    }

    /// Validate the configuration before assembling
    pub fn validate(&self) -> Result<()> {
        DifficultyTarget::parse(&self.chain.difficulty_target)?;
        validate_digest_hex("prev_block_hash", &self.chain.prev_block_hash)?;

        if self.chain.reward_txid.is_empty() {
            return Err(AssemblyError::InvalidConfig(
                "reward_txid must not be empty".to_string(),
            ));
        }
        if self.miner.threads == 0 {
            return Err(AssemblyError::InvalidConfig(
                "miner.threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AssemblyConfig::default();
        assert_eq!(config.chain.version, 1);
        assert_eq!(config.chain.reward_txid, "coinbase");
        assert_eq!(config.chain.block_subsidy, 50);
        assert_eq!(config.miner.threads, 1);
        assert!(config.miner.max_nonce.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AssemblyConfig =
            serde_json::from_str(r#"{"miner": {"threads": 4, "max_nonce": 1000}}"#).unwrap();
        assert_eq!(config.miner.threads, 4);
        assert_eq!(config.miner.max_nonce, Some(1000));
        assert_eq!(config.chain.prev_block_hash, crate::DEFAULT_PREV_BLOCK_HASH);
    }

    #[test]
    fn test_env_overrides() {
        let easy_target = "f".repeat(64);
        let vars: HashMap<&str, String> = [
            ("QC_MINER_THREADS", "3".to_string()),
            ("QC_MAX_NONCE", "500".to_string()),
            ("QC_DIFFICULTY_TARGET", easy_target.clone()),
        ]
        .into_iter()
        .collect();

        let mut config = AssemblyConfig::default();
        config.apply_overrides(|k| vars.get(k).cloned());

        assert_eq!(config.miner.threads, 3);
        assert_eq!(config.miner.max_nonce, Some(500));
        assert_eq!(config.chain.difficulty_target, easy_target);
    }

    #[test]
    fn test_unparsable_env_values_are_ignored() {
        let mut config = AssemblyConfig::default();
        config.apply_overrides(|k| match k {
            "QC_MINER_THREADS" | "QC_MAX_NONCE" => Some("lots".to_string()),
            _ => None,
        });
        assert_eq!(config.miner.threads, 1);
        assert!(config.miner.max_nonce.is_none());
    }

    #[test]
    fn test_zero_threads_means_all_cpus() {
        let mut config = AssemblyConfig::default();
        config.apply_overrides(|k| (k == "QC_MINER_THREADS").then(|| "0".to_string()));
        assert_eq!(config.miner.threads, num_cpus::get());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AssemblyConfig::default();
        config.chain.prev_block_hash = "0000".to_string();
        assert!(matches!(
            config.validate(),
            Err(AssemblyError::InvalidConfig(_))
        ));

        let mut config = AssemblyConfig::default();
        config.chain.difficulty_target = "F".repeat(64);
        assert!(config.validate().is_err());

        let mut config = AssemblyConfig::default();
        config.miner.threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assembly.json");
        std::fs::write(&path, r#"{"chain": {"block_subsidy": 25}}"#).unwrap();

        let config = AssemblyConfig::from_json_file(&path).unwrap();
        assert_eq!(config.chain.block_subsidy, 25);
        assert_eq!(config.chain.version, 1);
    }
}
