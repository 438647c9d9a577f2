//! Inbound ports (driving side - API)

use crate::domain::AssembledBlock;
use crate::error::Result;
use crate::metrics::MetricsSnapshot;

use super::outbound::{BlockSink, TransactionSource};

/// Primary port: Block assembly service
pub trait BlockAssemblyApi {
    /// Assemble and mine one block from `source`, writing it to `sink`
    fn assemble(
        &self,
        source: &mut dyn TransactionSource,
        sink: &mut dyn BlockSink,
    ) -> Result<AssembledBlock>;

    /// Get current assembly status
    fn status(&self) -> AssemblyStatus;
}

/// Assembly status
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblyStatus {
    /// Counters accumulated by this assembler
    pub metrics: MetricsSnapshot,

    /// Digest of the last mined block
    pub last_block_hash: Option<String>,

    /// Nonce of the last mined block
    pub last_nonce: Option<u64>,

    /// Whether a nonce search is running right now
    pub mining: bool,
}
