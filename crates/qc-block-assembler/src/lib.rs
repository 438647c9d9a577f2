//! # Quantum Chain - Block Assembler
//!
//! **Bounded Context:** Single-block assembly & proof-of-work
//! **Architecture Compliance:** DDD + Hexagonal + TDD
//!
//! ## Purpose
//!
//! Assembles one block for a minimal proof-of-work ledger:
//! - Filters candidate transactions with a simplified conservation check
//! - Prepends a synthetic reward (coinbase) transaction
//! - Commits to the ordered identifiers with a Merkle root
//! - Searches for a header nonce whose SHA-256d digest is below the target
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - MempoolDirectory: JSON transaction files         │
//! │  - OutputFile: line-oriented block output           │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: BlockAssemblyApi                        │
//! │  - Outbound: TransactionSource, BlockSink           │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - TransactionValidator                             │
//! │  - MerkleTreeBuilder                                │
//! │  - ProofOfWorkMiner                                 │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Output
//!
//! A sink receives `2 + K` lines for `K` identifiers: the mined header as
//! JSON, the reward transaction as JSON, then one identifier per line
//! (reward first).
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use qc_block_assembler::{AssemblyConfig, BlockAssembler, MempoolDirectory, OutputFile};
//!
//! let assembler = BlockAssembler::new(AssemblyConfig::default())?;
//! let block = assembler.assemble(
//!     &mut MempoolDirectory::new("mempool"),
//!     &mut OutputFile::new("output.txt"),
//! )?;
//! println!("mined {:?}", block.header.block_hash);
//! # Ok::<(), qc_block_assembler::AssemblyError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Source and sink implementations
pub mod adapters;
/// Domain models and business logic
pub mod domain;
/// Hexagonal ports
pub mod ports;
/// Assembly orchestration
pub mod service;
/// Hashing helpers
pub mod utils;

mod config;
mod error;
mod metrics;

pub use config::{AssemblyConfig, ChainParams, MinerConfig};
pub use error::{AssemblyError, Result};
pub use metrics::{Metrics, MetricsSnapshot};

pub use domain::{
    AssembledBlock, BlockHeader, DifficultyTarget, MerkleTreeBuilder, MiningState,
    ProofOfWorkMiner, RejectReason, RewardTransaction, TransactionRecord, TransactionValidator,
    TxInput, TxOutput,
};

pub use ports::{AssemblyStatus, BlockAssemblyApi, BlockSink, TransactionSource};

pub use adapters::{InMemorySink, InMemorySource, MempoolDirectory, OutputFile};

pub use service::BlockAssembler;

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Default protocol version
pub const DEFAULT_VERSION: u32 = 1;

/// Default previous block digest
pub const DEFAULT_PREV_BLOCK_HASH: &str =
    "0000111100000000000000000000000000000000000000000000000000000000";

/// Default difficulty target
pub const DEFAULT_DIFFICULTY_TARGET: &str =
    "0000ffff00000000000000000000000000000000000000000000000000000000";

/// Identifier of the reward transaction
pub const REWARD_TXID: &str = "coinbase";

/// Default locking script of the reward output
pub const DEFAULT_REWARD_SCRIPTPUBKEY: &str =
    "51202219ab3fa8a1d392f883d388d504e62e450e1f442fd1e61558b008fbf36f01a2";

/// Default block subsidy
pub const DEFAULT_BLOCK_SUBSIDY: u64 = 50;
