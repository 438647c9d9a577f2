//! # Quantum-Chain Block Assembler
//!
//! Reads a mempool directory, assembles and mines one block, writes it out.
//!
//! ```text
//! qc-block-assembler [MEMPOOL_DIR] [OUTPUT_PATH]
//! ```
//!
//! ## Environment
//!
//! - `QC_CONFIG` - JSON config file (defaults apply to missing keys)
//! - `QC_DIFFICULTY_TARGET`, `QC_PREV_BLOCK_HASH` - chain constant overrides
//! - `QC_MINER_THREADS` - worker threads, `0` = all CPUs
//! - `QC_MAX_NONCE` - nonce ceiling; without it the search is unbounded
//! - `RUST_LOG` - log filter (default `info`)

use anyhow::{Context, Result};
use qc_block_assembler::{AssemblyConfig, BlockAssembler, MempoolDirectory, OutputFile};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_MEMPOOL_DIR: &str = "mempool";
const DEFAULT_OUTPUT_PATH: &str = "output.txt";

/// Load configuration from file and environment.
fn load_config() -> Result<AssemblyConfig> {
    let mut config = match std::env::var("QC_CONFIG") {
        Ok(path) => AssemblyConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        Err(_) => AssemblyConfig::default(),
    };
    config.apply_env_overrides();
    Ok(config)
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args().skip(1);
    let mempool_dir = args.next().unwrap_or_else(|| DEFAULT_MEMPOOL_DIR.to_string());
    let output_path = args.next().unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string());

    let config = load_config()?;
    let assembler = BlockAssembler::new(config).context("Invalid assembly configuration")?;

    let block = assembler
        .assemble(
            &mut MempoolDirectory::new(&mempool_dir),
            &mut OutputFile::new(&output_path),
        )
        .context("Block assembly failed")?;

    let metrics = assembler.metrics();
    info!(
        "Mined block {} (nonce={}, txs={}, dropped={}, {:.0} H/s)",
        block.header.block_hash.as_deref().unwrap_or_default(),
        block.header.nonce,
        block.txids.len(),
        block.rejected,
        metrics.hashrate()
    );
    info!("Output written to {}", output_path);

    Ok(())
}
