//! Reward (coinbase) transaction
//!
//! The reward transaction is synthetic: its identifier is fixed rather than
//! derived from a hash, it is never validated, and it is always the first
//! transaction of the block.

use super::entities::TxOutput;
use crate::config::ChainParams;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Synthetic transaction paying the block subsidy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTransaction {
    /// Fixed identifier
    pub txid: String,

    /// Single output carrying the subsidy
    pub vout: Vec<TxOutput>,
}

impl RewardTransaction {
    /// Create a reward paying `subsidy` to `scriptpubkey`
    pub fn new(txid: impl Into<String>, scriptpubkey: impl Into<String>, subsidy: u64) -> Self {
        Self {
            txid: txid.into(),
            vout: vec![TxOutput::new(subsidy, scriptpubkey)],
        }
    }

    /// Reward shaped by the chain constants
    pub fn from_params(params: &ChainParams) -> Self {
        Self::new(
            params.reward_txid.clone(),
            params.reward_scriptpubkey.clone(),
            params.block_subsidy,
        )
    }

    /// Total value paid out
    pub fn subsidy(&self) -> u64 {
        self.vout.iter().map(|o| o.value).sum()
    }

    /// Reward as one JSON line
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for RewardTransaction {
    fn default() -> Self {
        Self::from_params(&ChainParams::default())
    }
}
