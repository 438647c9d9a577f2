//! # End-to-end tests for the block assembler
//!
//! ## Test Categories
//!
//! 1. **Output shape** - line count and order for accepted/dropped records
//! 2. **Proof-of-work** - mined digest recomputed independently
//! 3. **File adapters** - mempool directory in, output file out
//! 4. **Failure paths** - collaborator errors and exhausted searches

use qc_block_assembler::{
    AssemblyConfig, AssemblyError, BlockAssembler, BlockHeader, BlockSink, InMemorySink,
    InMemorySource, MempoolDirectory, MerkleTreeBuilder, OutputFile, Result, TransactionRecord,
    TransactionSource, TxInput, TxOutput,
};
use sha2::{Digest, Sha256};

// =============================================================================
// TEST HELPERS
// =============================================================================

const EASY_TARGET: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
const TIMESTAMP: i64 = 1_713_000_000;

fn easy_assembler() -> BlockAssembler {
    let mut config = AssemblyConfig::default();
    config.chain.difficulty_target = EASY_TARGET.to_string();
    BlockAssembler::new(config).unwrap()
}

fn make_tx(txid: &str, prev_value: u64, out_values: &[u64]) -> TransactionRecord {
    TransactionRecord::new(
        txid,
        vec![TxInput::spending(format!("{}-parent", txid), prev_value)],
        out_values.iter().map(|v| TxOutput::new(*v, "0014abcd")).collect(),
    )
}

/// Independent double SHA-256, hex encoded
fn double_sha256_hex(text: &str) -> String {
    let first = Sha256::digest(text.as_bytes());
    hex::encode(Sha256::digest(first))
}

struct FailingSource;

impl TransactionSource for FailingSource {
    fn load_transactions(&mut self) -> Result<Vec<TransactionRecord>> {
        Err(AssemblyError::Source("store offline".to_string()))
    }
}

struct FailingSink;

impl BlockSink for FailingSink {
    fn write_lines(&mut self, _lines: &[String]) -> Result<()> {
        Err(AssemblyError::Sink("disk full".to_string()))
    }
}

// =============================================================================
// OUTPUT SHAPE
// =============================================================================

#[test]
fn test_two_valid_records_all_included() {
    let assembler = easy_assembler();
    let mut source = InMemorySource::new(vec![
        make_tx("tx-one", 5_000, &[1_000, 2_000]),
        make_tx("tx-two", 800, &[700]),
    ]);
    let mut sink = InMemorySink::new();

    let block = assembler
        .assemble_at(&mut source, &mut sink, TIMESTAMP)
        .unwrap();

    assert_eq!(block.txids, vec!["coinbase", "tx-one", "tx-two"]);
    // header + reward + 3 identifiers
    assert_eq!(sink.lines.len(), 5);
    assert_eq!(sink.lines[1..].len(), 4);
    assert_eq!(&sink.lines[2..], &["coinbase", "tx-one", "tx-two"]);
    assert_eq!(sink.writes, 1);
}

#[test]
fn test_overspending_record_dropped() {
    let assembler = easy_assembler();
    let mut source = InMemorySource::new(vec![
        make_tx("tx-one", 5_000, &[1_000, 2_000]),
        make_tx("tx-greedy", 700, &[700]),
    ]);
    let mut sink = InMemorySink::new();

    let block = assembler
        .assemble_at(&mut source, &mut sink, TIMESTAMP)
        .unwrap();

    assert_eq!(block.rejected, 1);
    assert_eq!(sink.lines.len(), 4);
    assert_eq!(sink.lines[1..].len(), 3);
    assert_eq!(&sink.lines[2..], &["coinbase", "tx-one"]);
}

#[test]
fn test_malformed_records_dropped_without_error() {
    let assembler = easy_assembler();
    let mut no_outputs = make_tx("no-outputs", 100, &[1]);
    no_outputs.vout = None;
    let mut no_inputs = make_tx("no-inputs", 100, &[1]);
    no_inputs.vin = None;
    let mut source = InMemorySource::new(vec![no_outputs, no_inputs, make_tx("ok", 100, &[1])]);

    let block = assembler
        .assemble_at(&mut source, &mut InMemorySink::new(), TIMESTAMP)
        .unwrap();
    assert_eq!(block.txids, vec!["coinbase", "ok"]);
    assert_eq!(block.rejected, 2);
}

#[test]
fn test_header_and_reward_lines() {
    let assembler = easy_assembler();
    let mut sink = InMemorySink::new();
    let block = assembler
        .assemble_at(
            &mut InMemorySource::new(vec![make_tx("tx-one", 10, &[1])]),
            &mut sink,
            TIMESTAMP,
        )
        .unwrap();

    let header: BlockHeader = serde_json::from_str(&sink.lines[0]).unwrap();
    assert_eq!(header, block.header);
    assert_eq!(header.timestamp, TIMESTAMP);
    assert_eq!(
        header.merkle_root,
        MerkleTreeBuilder::root(&["coinbase", "tx-one"])
    );

    let reward: serde_json::Value = serde_json::from_str(&sink.lines[1]).unwrap();
    assert_eq!(reward["txid"], "coinbase");
    assert_eq!(reward["vout"][0]["value"], 50);
    assert_eq!(
        reward["vout"][0]["scriptpubkey"],
        qc_block_assembler::DEFAULT_REWARD_SCRIPTPUBKEY
    );
}

// =============================================================================
// PROOF-OF-WORK
// =============================================================================

#[test]
fn test_trivial_target_mines_nonce_zero() {
    let assembler = easy_assembler();
    let block = assembler
        .assemble_at(
            &mut InMemorySource::default(),
            &mut InMemorySink::new(),
            TIMESTAMP,
        )
        .unwrap();

    let header = &block.header;
    assert_eq!(header.nonce, 0);

    let preimage = format!(
        "{}{}{}{}{}{}",
        header.version,
        header.prev_block_hash,
        header.merkle_root,
        header.timestamp,
        header.difficulty_target,
        0
    );
    assert_eq!(
        header.block_hash.as_deref(),
        Some(double_sha256_hex(&preimage).as_str())
    );
}

#[test]
fn test_mined_digest_below_target() {
    let mut config = AssemblyConfig::default();
    config.chain.difficulty_target =
        "00ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff".to_string();
    config.miner.threads = 2;
    let assembler = BlockAssembler::new(config).unwrap();

    let block = assembler
        .assemble_at(
            &mut InMemorySource::new(vec![make_tx("tx-one", 10, &[1])]),
            &mut InMemorySink::new(),
            TIMESTAMP,
        )
        .unwrap();

    let header = &block.header;
    let digest = header.block_hash.clone().unwrap();
    assert!(digest.as_str() < header.difficulty_target.as_str());
    assert_eq!(digest, double_sha256_hex(&header.mining_preimage(header.nonce)));

    // No lower nonce satisfies the target
    for nonce in 0..header.nonce {
        assert!(
            double_sha256_hex(&header.mining_preimage(nonce)).as_str()
                >= header.difficulty_target.as_str()
        );
    }
}

// =============================================================================
// FILE ADAPTERS
// =============================================================================

#[test]
fn test_mempool_directory_to_output_file() {
    let mempool = tempfile::tempdir().unwrap();
    std::fs::write(
        mempool.path().join("0a1b.json"),
        r#"{"version": 2, "locktime": 0,
            "vin": [{"txid": "ff00", "vout": 1, "prevout": {"scriptpubkey": "0014", "value": 90000}}],
            "vout": [{"scriptpubkey": "0014", "value": 60000}, {"scriptpubkey": "0014", "value": 20000}]}"#,
    )
    .unwrap();
    std::fs::write(
        mempool.path().join("0c2d.json"),
        r#"{"version": 2, "locktime": 0,
            "vin": [{"txid": "ee11", "vout": 0, "prevout": {"scriptpubkey": "0014", "value": 1000}}],
            "vout": [{"scriptpubkey": "0014", "value": 5000}]}"#,
    )
    .unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("output.txt");

    let block = easy_assembler()
        .assemble_at(
            &mut MempoolDirectory::new(mempool.path()),
            &mut OutputFile::new(&output),
            TIMESTAMP,
        )
        .unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[2], "coinbase");
    assert_eq!(lines[3], "0a1b");
    assert_eq!(block.rejected, 1);
}

// =============================================================================
// FAILURE PATHS
// =============================================================================

#[test]
fn test_source_failure_propagates() {
    let mut sink = InMemorySink::new();
    let err = easy_assembler()
        .assemble_at(&mut FailingSource, &mut sink, TIMESTAMP)
        .unwrap_err();
    assert!(matches!(err, AssemblyError::Source(_)));
    assert_eq!(sink.writes, 0);
}

#[test]
fn test_sink_failure_propagates() {
    let err = easy_assembler()
        .assemble_at(&mut InMemorySource::default(), &mut FailingSink, TIMESTAMP)
        .unwrap_err();
    assert!(matches!(err, AssemblyError::Sink(_)));
    assert!(err.is_collaborator_failure());
}

#[test]
fn test_exhausted_search_writes_nothing() {
    let mut config = AssemblyConfig::default();
    config.chain.difficulty_target = "0".repeat(64);
    config.miner.max_nonce = Some(200);
    config.miner.threads = 3;
    let assembler = BlockAssembler::new(config).unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("output.txt");
    let err = assembler
        .assemble_at(
            &mut InMemorySource::new(vec![make_tx("tx-one", 10, &[1])]),
            &mut OutputFile::new(&output),
            TIMESTAMP,
        )
        .unwrap_err();

    assert!(matches!(err, AssemblyError::MiningExhausted { attempts: 201 }));
    assert!(err.is_recoverable());
    assert!(!output.exists());
}

#[test]
fn test_cancel_handle_stops_unbounded_search() {
    let mut config = AssemblyConfig::default();
    config.chain.difficulty_target = "0".repeat(64);
    config.miner.threads = 2;
    let assembler = std::sync::Arc::new(BlockAssembler::new(config).unwrap());
    let cancel = assembler.cancel_handle();

    let worker = {
        let assembler = std::sync::Arc::clone(&assembler);
        std::thread::spawn(move || {
            assembler.assemble_at(
                &mut InMemorySource::default(),
                &mut InMemorySink::new(),
                TIMESTAMP,
            )
        })
    };

    // Keep raising the flag: the assembler clears it when it starts
    while !worker.is_finished() {
        cancel.store(true, std::sync::atomic::Ordering::Relaxed);
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    let err = worker.join().unwrap().unwrap_err();
    assert!(matches!(err, AssemblyError::MiningCancelled { .. }));
}
