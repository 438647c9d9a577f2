//! Metrics collection for block assembly

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for block assembly
#[derive(Debug, Default)]
pub struct Metrics {
    /// Records pulled from transaction sources
    pub records_seen: AtomicU64,

    /// Records accepted by validation
    pub records_accepted: AtomicU64,

    /// Records dropped by validation
    pub records_rejected: AtomicU64,

    /// Blocks mined and written to a sink
    pub blocks_assembled: AtomicU64,

    /// Header digests computed by the miner
    pub hashes_computed: AtomicU64,

    /// Total PoW mining time (milliseconds)
    pub mining_time_ms: AtomicU64,
}

/// Point-in-time copy of [`Metrics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Records pulled from transaction sources
    pub records_seen: u64,
    /// Records accepted by validation
    pub records_accepted: u64,
    /// Records dropped by validation
    pub records_rejected: u64,
    /// Blocks mined and written to a sink
    pub blocks_assembled: u64,
    /// Header digests computed by the miner
    pub hashes_computed: u64,
    /// Total PoW mining time (milliseconds)
    pub mining_time_ms: u64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of validating one batch
    pub fn record_validation(&self, accepted: u64, rejected: u64) {
        self.records_seen
            .fetch_add(accepted + rejected, Ordering::Relaxed);
        self.records_accepted.fetch_add(accepted, Ordering::Relaxed);
        self.records_rejected.fetch_add(rejected, Ordering::Relaxed);
    }

    /// Record an assembled block
    pub fn record_block_assembled(&self) {
        self.blocks_assembled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record hashes computed by a search
    pub fn record_hashes(&self, count: u64) {
        self.hashes_computed.fetch_add(count, Ordering::Relaxed);
    }

    /// Record PoW mining time
    pub fn record_mining_time(&self, duration_ms: u64) {
        self.mining_time_ms
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    /// Average hash rate over all searches (hashes per second)
    pub fn hashrate(&self) -> f64 {
        let ms = self.mining_time_ms.load(Ordering::Relaxed);
        if ms == 0 {
            return 0.0;
        }
        self.hashes_computed.load(Ordering::Relaxed) as f64 * 1000.0 / ms as f64
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_seen: self.records_seen.load(Ordering::Relaxed),
            records_accepted: self.records_accepted.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            blocks_assembled: self.blocks_assembled.load(Ordering::Relaxed),
            hashes_computed: self.hashes_computed.load(Ordering::Relaxed),
            mining_time_ms: self.mining_time_ms.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
        assert_eq!(metrics.hashrate(), 0.0);
    }

    #[test]
    fn test_record_validation() {
        let metrics = Metrics::new();
        metrics.record_validation(3, 2);
        metrics.record_validation(1, 0);

        let snap = metrics.snapshot();
        assert_eq!(snap.records_seen, 6);
        assert_eq!(snap.records_accepted, 4);
        assert_eq!(snap.records_rejected, 2);
    }

    #[test]
    fn test_hashrate() {
        let metrics = Metrics::new();
        metrics.record_hashes(5000);
        metrics.record_mining_time(500);
        assert_eq!(metrics.hashrate(), 10_000.0);
    }
}
