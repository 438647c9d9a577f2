//! Block assembly orchestration
//!
//! Pipeline: source → validator → identifiers → Merkle root → header →
//! miner → sink. Nothing reaches the sink unless mining succeeds.

use crate::{
    config::AssemblyConfig,
    domain::{
        AssembledBlock, BlockHeader, MerkleTreeBuilder, ProofOfWorkMiner, RewardTransaction,
        TransactionValidator,
    },
    error::Result,
    metrics::Metrics,
    ports::{AssemblyStatus, BlockAssemblyApi, BlockSink, TransactionSource},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Assembles and mines single blocks from a fixed configuration
pub struct BlockAssembler {
    /// Fixed chain constants and miner settings
    config: AssemblyConfig,

    /// Reward transaction prepended to every block
    reward: RewardTransaction,

    /// Nonce search
    miner: ProofOfWorkMiner,

    /// Shared counters
    metrics: Arc<Metrics>,

    /// Raised to abort the running search
    cancel: Arc<AtomicBool>,

    /// Whether a search is running
    mining: AtomicBool,

    /// Digest and nonce of the last mined block
    last_block: RwLock<Option<(String, u64)>>,
}

impl BlockAssembler {
    /// Create an assembler; fails on invalid configuration
    pub fn new(config: AssemblyConfig) -> Result<Self> {
        config.validate()?;

        info!("[block-assembler] Initializing block assembler");
        info!("  Version: {}", config.chain.version);
        info!("  Difficulty Target: {}", config.chain.difficulty_target);
        info!("  Miner Threads: {}", config.miner.threads);
        match config.miner.max_nonce {
            Some(max) => info!("  Nonce Ceiling: {}", max),
            None => info!("  Nonce Ceiling: none (unbounded search)"),
        }

        let metrics = Arc::new(Metrics::new());
        let miner = ProofOfWorkMiner::from_config(&config.miner).with_metrics(Arc::clone(&metrics));
        let reward = RewardTransaction::from_params(&config.chain);

        Ok(Self {
            config,
            reward,
            miner,
            metrics,
            cancel: Arc::new(AtomicBool::new(false)),
            mining: AtomicBool::new(false),
            last_block: RwLock::new(None),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Shared metrics
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Flag that stops the search of the assembly in progress.
    ///
    /// The flag is cleared when an assembly starts.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Assemble with the current wall-clock time
    pub fn assemble<S, K>(&self, source: &mut S, sink: &mut K) -> Result<AssembledBlock>
    where
        S: TransactionSource + ?Sized,
        K: BlockSink + ?Sized,
    {
        self.assemble_at(source, sink, chrono::Utc::now().timestamp())
    }

    /// Assemble with a fixed header timestamp
    #[tracing::instrument(skip(self, source, sink))]
    pub fn assemble_at<S, K>(
        &self,
        source: &mut S,
        sink: &mut K,
        timestamp: i64,
    ) -> Result<AssembledBlock>
    where
        S: TransactionSource + ?Sized,
        K: BlockSink + ?Sized,
    {
        self.cancel.store(false, Ordering::Relaxed);

        // Step 1: Pull records
        let records = source.load_transactions()?;

        // Step 2-4: Validate, reward first, collect identifiers
        let mut txids = Vec::with_capacity(records.len() + 1);
        txids.push(self.reward.txid.clone());
        let mut rejected = 0usize;
        for record in records {
            match TransactionValidator::check(&record) {
                Ok(()) => txids.push(record.txid),
                Err(reason) => {
                    rejected += 1;
                    debug!("Dropping transaction {}: {}", record.txid, reason);
                }
            }
        }
        let accepted = txids.len() - 1;
        self.metrics.record_validation(accepted as u64, rejected as u64);
        info!(
            "Transaction validation complete: accepted={}, rejected={}",
            accepted, rejected
        );

        // Step 5: Merkle root
        let merkle_root = MerkleTreeBuilder::root(&txids);
        debug!("Merkle root: {:?}", merkle_root);

        // Step 6-7: Header and mining
        let chain = &self.config.chain;
        let header = BlockHeader::unmined(
            chain.version,
            chain.prev_block_hash.clone(),
            merkle_root,
            timestamp,
            chain.difficulty_target.clone(),
        );

        self.mining.store(true, Ordering::Relaxed);
        let mined = self.miner.mine_with_cancel(header, &self.cancel);
        self.mining.store(false, Ordering::Relaxed);
        let header = mined?;

        // Step 8: Emit
        let block = AssembledBlock {
            header,
            reward: self.reward.clone(),
            txids,
            rejected,
        };
        let lines = block.to_lines()?;
        sink.write_lines(&lines)?;

        self.metrics.record_block_assembled();
        if let (Ok(mut last), Some(hash)) = (self.last_block.write(), &block.header.block_hash) {
            *last = Some((hash.clone(), block.header.nonce));
        }

        info!(
            "Block assembled: hash={}, nonce={}, transactions={}",
            block.header.block_hash.as_deref().unwrap_or_default(),
            block.header.nonce,
            block.txids.len()
        );
        Ok(block)
    }
}

impl BlockAssemblyApi for BlockAssembler {
    fn assemble(
        &self,
        source: &mut dyn TransactionSource,
        sink: &mut dyn BlockSink,
    ) -> Result<AssembledBlock> {
        BlockAssembler::assemble(self, source, sink)
    }

    fn status(&self) -> AssemblyStatus {
        let last = self
            .last_block
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        AssemblyStatus {
            metrics: self.metrics.snapshot(),
            last_block_hash: last.as_ref().map(|(hash, _)| hash.clone()),
            last_nonce: last.map(|(_, nonce)| nonce),
            mining: self.mining.load(Ordering::Relaxed),
        }
    }
}
