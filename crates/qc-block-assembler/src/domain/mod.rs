//! Domain layer - Pure business logic for block assembly
//!
//! All code here is free of I/O: records come in as values, the header goes
//! out as a value.
//!
//! ## Entities
//!
//! - [`TransactionRecord`]: Candidate transaction from a source
//! - [`RewardTransaction`]: Synthetic coinbase, always first in the block
//! - [`BlockHeader`]: Header mutated in place by the miner
//! - [`DifficultyTarget`]: Parsed target for byte-wise comparison
//!
//! ## Services
//!
//! - [`TransactionValidator`]: Simplified conservation check
//! - [`MerkleTreeBuilder`]: Pairwise double-SHA-256 reduction
//! - [`ProofOfWorkMiner`]: Sequential or strided-parallel nonce search

mod entities;
pub mod merkle;
pub mod miner;
mod reward;
pub mod validator;

pub use entities::*;
pub(crate) use entities::validate_digest_hex;
pub use merkle::MerkleTreeBuilder;
pub use miner::{MiningReport, MiningState, NonceSearch, ProofOfWorkMiner};
pub use reward::RewardTransaction;
pub use validator::{RejectReason, TransactionValidator};
