//! Domain entities for block assembly

use super::reward::RewardTransaction;
use crate::error::{AssemblyError, Result};
use serde::{Deserialize, Serialize};

/// Candidate transaction as supplied by a transaction source.
///
/// `vin`/`vout` are `None` when the source record lacked the sequence
/// entirely; such records are malformed and get rejected by the validator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction identifier
    #[serde(default)]
    pub txid: String,

    /// Inputs in order
    #[serde(default)]
    pub vin: Option<Vec<TxInput>>,

    /// Outputs in order
    #[serde(default)]
    pub vout: Option<Vec<TxOutput>>,
}

impl TransactionRecord {
    /// Create a well-formed record
    pub fn new(txid: impl Into<String>, vin: Vec<TxInput>, vout: Vec<TxOutput>) -> Self {
        Self {
            txid: txid.into(),
            vin: Some(vin),
            vout: Some(vout),
        }
    }

    /// Sum of all output values, `None` if the outputs sequence is missing
    pub fn total_output_value(&self) -> Option<u128> {
        self.vout
            .as_ref()
            .map(|outputs| outputs.iter().map(|o| u128::from(o.value)).sum())
    }
}

/// Transaction input
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Identifier of the transaction being spent from
    #[serde(default)]
    pub txid: String,

    /// Output being spent
    #[serde(default)]
    pub prevout: Option<PrevOut>,
}

impl TxInput {
    /// Input spending `prev_value` from transaction `txid`
    pub fn spending(txid: impl Into<String>, prev_value: u64) -> Self {
        Self {
            txid: txid.into(),
            prevout: Some(PrevOut {
                value: Some(prev_value),
                scriptpubkey: None,
            }),
        }
    }

    /// Value of the referenced previous output, if present
    pub fn prev_value(&self) -> Option<u64> {
        self.prevout.as_ref().and_then(|p| p.value)
    }
}

/// Previous output referenced by an input
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrevOut {
    /// Value locked in the previous output
    #[serde(default, deserialize_with = "amount::deserialize_opt")]
    pub value: Option<u64>,

    /// Locking script of the previous output (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scriptpubkey: Option<String>,
}

/// Transaction output. Field order is the serialised order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Locking condition (opaque)
    #[serde(default)]
    pub scriptpubkey: String,

    /// Output value
    #[serde(deserialize_with = "amount::deserialize")]
    pub value: u64,
}

impl TxOutput {
    /// Create an output
    pub fn new(value: u64, scriptpubkey: impl Into<String>) -> Self {
        Self {
            scriptpubkey: scriptpubkey.into(),
            value,
        }
    }
}

/// Amounts written either as integers or as integral floats (`1000.0`)
mod amount {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Integer(u64),
        Float(f64),
    }

    // 2^64, the first float past u64::MAX
    const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

    impl Amount {
        fn into_u64<E: Error>(self) -> Result<u64, E> {
            match self {
                Amount::Integer(value) => Ok(value),
                Amount::Float(value)
                    if value >= 0.0 && value.fract() == 0.0 && value < U64_LIMIT =>
                {
                    Ok(value as u64)
                }
                Amount::Float(value) => Err(E::custom(format!(
                    "amount {} is not a non-negative whole number",
                    value
                ))),
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Amount::deserialize(deserializer)?.into_u64()
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        Option::<Amount>::deserialize(deserializer)?
            .map(Amount::into_u64)
            .transpose()
    }
}

/// Block header. Field order is the serialised order of the output line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Protocol version
    pub version: u32,

    /// Previous block digest (hex)
    pub prev_block_hash: String,

    /// Merkle root (hex, empty when there are no identifiers)
    pub merkle_root: String,

    /// Unix timestamp captured at assembly time
    pub timestamp: i64,

    /// Difficulty target (hex, same length as digests)
    pub difficulty_target: String,

    /// Nonce (written by the miner)
    pub nonce: u64,

    /// Resulting digest (written by the miner)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
}

impl BlockHeader {
    /// Header awaiting mining: nonce 0, no digest
    pub fn unmined(
        version: u32,
        prev_block_hash: impl Into<String>,
        merkle_root: impl Into<String>,
        timestamp: i64,
        difficulty_target: impl Into<String>,
    ) -> Self {
        Self {
            version,
            prev_block_hash: prev_block_hash.into(),
            merkle_root: merkle_root.into(),
            timestamp,
            difficulty_target: difficulty_target.into(),
            nonce: 0,
            block_hash: None,
        }
    }

    /// Preimage text without the nonce
    pub fn mining_prefix(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.version,
            self.prev_block_hash,
            self.merkle_root,
            self.timestamp,
            self.difficulty_target
        )
    }

    /// Canonical text hashed for `nonce`: all fields concatenated, no separators
    pub fn mining_preimage(&self, nonce: u64) -> String {
        format!("{}{}", self.mining_prefix(), nonce)
    }

    /// Whether the miner has filled in the digest
    pub fn is_mined(&self) -> bool {
        self.block_hash.is_some()
    }

    /// Header as one JSON line
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parsed difficulty target.
///
/// Only lowercase hex is accepted, so byte order and hex string order agree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DifficultyTarget {
    hex: String,
    bytes: [u8; 32],
}

impl DifficultyTarget {
    /// Parse a 64-char lowercase hex target
    pub fn parse(target: &str) -> Result<Self> {
        validate_digest_hex("difficulty_target", target)?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(target, &mut bytes)
            .map_err(|e| AssemblyError::InvalidConfig(format!("difficulty_target: {}", e)))?;
        Ok(Self {
            hex: target.to_string(),
            bytes,
        })
    }

    /// True when `digest` is strictly below the target (big-endian)
    #[inline]
    pub fn is_met_by(&self, digest: &[u8; 32]) -> bool {
        digest < &self.bytes
    }

    /// Target as hex
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// Target as raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

/// Check that a field holds a 64-char lowercase hex digest
pub(crate) fn validate_digest_hex(field: &str, value: &str) -> Result<()> {
    let well_formed = value.len() == crate::DIGEST_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return Err(AssemblyError::InvalidConfig(format!(
            "{} must be {} lowercase hex chars, got {:?}",
            field,
            crate::DIGEST_HEX_LEN,
            value
        )));
    }
    Ok(())
}

/// Outcome of one assembly
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledBlock {
    /// Mined header
    pub header: BlockHeader,

    /// Reward transaction (first in the block)
    pub reward: RewardTransaction,

    /// Identifiers in block order, reward first
    pub txids: Vec<String>,

    /// Records dropped by validation
    pub rejected: usize,
}

impl AssembledBlock {
    /// Number of source records accepted into the block
    pub fn accepted(&self) -> usize {
        self.txids.len().saturating_sub(1)
    }

    /// Sink lines: header, reward, then one identifier per line
    pub fn to_lines(&self) -> Result<Vec<String>> {
        let mut lines = Vec::with_capacity(2 + self.txids.len());
        lines.push(self.header.to_json_line()?);
        lines.push(self.reward.to_json_line()?);
        lines.extend(self.txids.iter().cloned());
        Ok(lines)
    }
}
