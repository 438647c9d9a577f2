//! Proof-of-work nonce search
//!
//! The search is modelled as a state machine:
//!
//! ```text
//! Searching{n} ──digest < target──→ Found
//!      │ ├──────n > max_nonce─────→ Exhausted
//!      │ └──────cancel flag───────→ Cancelled
//!      └──otherwise──→ Searching{n + stride}
//! ```
//!
//! Without a `max_nonce` ceiling the search is unbounded: if no nonce in
//! `0..=u64::MAX` yields a digest below the target, `mine` does not return
//! in any practical amount of time. Configure a ceiling or keep the cancel
//! flag at hand when the target may be unreachable.
//!
//! Both the sequential and the parallel search return the *lowest*
//! satisfying nonce.

use super::entities::{BlockHeader, DifficultyTarget};
use crate::config::MinerConfig;
use crate::error::{AssemblyError, Result};
use crate::metrics::Metrics;
use crate::utils::hashing::sha256d;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::ScopedJoinHandle;
use std::time::Instant;

/// Nonces tried between two looks at the cancel flag (sequential search)
const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// State of a nonce search
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MiningState {
    /// Next nonce to try
    Searching {
        /// Nonce tried on the next step
        next_nonce: u64,
    },

    /// Digest below target
    Found {
        /// Winning nonce
        nonce: u64,
        /// Header digest, lowercase hex
        digest: String,
    },

    /// Ceiling passed without success
    Exhausted {
        /// Nonces tried
        attempts: u64,
    },

    /// Stopped through the cancel flag
    Cancelled {
        /// Nonces tried
        attempts: u64,
    },
}

impl MiningState {
    /// Whether no further step changes the state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Searching { .. })
    }
}

/// One cursor over the nonce space: `start, start + stride, ...`
pub struct NonceSearch<'a> {
    target: &'a DifficultyTarget,
    preimage: String,
    prefix_len: usize,
    stride: u64,
    max_nonce: Option<u64>,
    attempts: u64,
    state: MiningState,
}

impl<'a> NonceSearch<'a> {
    /// Sequential search from nonce 0
    pub fn new(header: &BlockHeader, target: &'a DifficultyTarget, max_nonce: Option<u64>) -> Self {
        Self::strided(header, target, 0, 1, max_nonce)
    }

    /// Search visiting `start, start + stride, start + 2 * stride, ...`
    pub fn strided(
        header: &BlockHeader,
        target: &'a DifficultyTarget,
        start: u64,
        stride: u64,
        max_nonce: Option<u64>,
    ) -> Self {
        let preimage = header.mining_prefix();
        let prefix_len = preimage.len();
        Self {
            target,
            preimage,
            prefix_len,
            stride: stride.max(1),
            max_nonce,
            attempts: 0,
            state: MiningState::Searching { next_nonce: start },
        }
    }

    /// Current state
    pub fn state(&self) -> &MiningState {
        &self.state
    }

    /// Consume the search, returning its state
    pub fn into_state(self) -> MiningState {
        self.state
    }

    /// Nonces hashed so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Try one nonce (no-op once terminal)
    pub fn step(&mut self) -> &MiningState {
        let nonce = match self.state {
            MiningState::Searching { next_nonce } => next_nonce,
            _ => return &self.state,
        };

        if self.max_nonce.is_some_and(|max| nonce > max) {
            self.state = MiningState::Exhausted {
                attempts: self.attempts,
            };
            return &self.state;
        }

        self.preimage.truncate(self.prefix_len);
        // Writing into a String cannot fail
        let _ = write!(self.preimage, "{}", nonce);
        let digest = sha256d(self.preimage.as_bytes());
        self.attempts += 1;

        self.state = if self.target.is_met_by(&digest) {
            MiningState::Found {
                nonce,
                digest: hex::encode(digest),
            }
        } else {
            match nonce.checked_add(self.stride) {
                Some(next_nonce) => MiningState::Searching { next_nonce },
                None => MiningState::Exhausted {
                    attempts: self.attempts,
                },
            }
        };
        &self.state
    }

    /// Move to `Cancelled` unless already terminal
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = MiningState::Cancelled {
                attempts: self.attempts,
            };
        }
    }

    /// Step until terminal, watching `cancel`
    pub fn run(&mut self, cancel: &AtomicBool) -> &MiningState {
        while !self.state.is_terminal() {
            if self.attempts % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                self.cancel();
                break;
            }
            self.step();
        }
        &self.state
    }
}

/// Result of a search: final state plus total hashes computed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MiningReport {
    /// Terminal state
    pub state: MiningState,
    /// Hashes computed across all workers
    pub attempts: u64,
}

/// PoW nonce search service
pub struct ProofOfWorkMiner {
    /// Worker threads (1 = scan on the calling thread)
    num_threads: usize,
    /// Inclusive nonce ceiling
    max_nonce: Option<u64>,
    metrics: Option<Arc<Metrics>>,
}

impl ProofOfWorkMiner {
    /// Create new PoW miner
    pub fn new(num_threads: usize, max_nonce: Option<u64>) -> Self {
        Self {
            num_threads: num_threads.max(1),
            max_nonce,
            metrics: None,
        }
    }

    /// Miner built from configuration
    pub fn from_config(config: &MinerConfig) -> Self {
        Self::new(config.threads, config.max_nonce)
    }

    /// Count hashes and mining time into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.num_threads
    }

    /// Search for the lowest nonce; blocks until found or the ceiling is hit
    pub fn mine(&self, header: BlockHeader) -> Result<BlockHeader> {
        self.mine_with_cancel(header, &AtomicBool::new(false))
    }

    /// Like [`Self::mine`], stopping with `MiningCancelled` once `cancel` is set
    #[tracing::instrument(
        skip(self, header, cancel),
        fields(threads = self.num_threads, root = %header.merkle_root)
    )]
    pub fn mine_with_cancel(
        &self,
        mut header: BlockHeader,
        cancel: &AtomicBool,
    ) -> Result<BlockHeader> {
        let target = DifficultyTarget::parse(&header.difficulty_target)?;

        tracing::debug!(
            "Starting PoW mining: target={}, max_nonce={:?}",
            target.as_str(),
            self.max_nonce
        );

        let started = Instant::now();
        let report = self.search(&header, &target, cancel);

        if let Some(metrics) = &self.metrics {
            metrics.record_hashes(report.attempts);
            metrics.record_mining_time(started.elapsed().as_millis() as u64);
        }

        match report.state {
            MiningState::Found { nonce, digest } => {
                tracing::info!(
                    "PoW mining successful: nonce={}, hash={}, attempts={}",
                    nonce,
                    digest,
                    report.attempts
                );
                header.nonce = nonce;
                header.block_hash = Some(digest);
                Ok(header)
            }
            MiningState::Cancelled { .. } => {
                tracing::warn!("PoW mining cancelled after {} attempts", report.attempts);
                Err(AssemblyError::MiningCancelled {
                    attempts: report.attempts,
                })
            }
            MiningState::Exhausted { .. } | MiningState::Searching { .. } => {
                tracing::warn!("PoW mining failed: no valid nonce found");
                Err(AssemblyError::MiningExhausted {
                    attempts: report.attempts,
                })
            }
        }
    }

    /// Run the search without touching the header
    pub fn search(
        &self,
        header: &BlockHeader,
        target: &DifficultyTarget,
        cancel: &AtomicBool,
    ) -> MiningReport {
        if self.num_threads == 1 {
            let mut search = NonceSearch::new(header, target, self.max_nonce);
            search.run(cancel);
            let attempts = search.attempts();
            return MiningReport {
                state: search.into_state(),
                attempts,
            };
        }
        self.search_parallel(header, target, cancel)
    }

    /// Worker `k` of `T` scans `k, k + T, k + 2T, ...`. The first hit of each
    /// worker is its lowest; workers keep going until their next nonce passes
    /// the best hit so far, so the minimum over all workers is exact.
    fn search_parallel(
        &self,
        header: &BlockHeader,
        target: &DifficultyTarget,
        cancel: &AtomicBool,
    ) -> MiningReport {
        let found = AtomicBool::new(false);
        let best_nonce = AtomicU64::new(u64::MAX);
        let stride = self.num_threads as u64;

        let outcomes: Vec<(MiningState, u64)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..stride)
                .map(|worker| {
                    let found = &found;
                    let best_nonce = &best_nonce;
                    scope.spawn(move || {
                        let mut search =
                            NonceSearch::strided(header, target, worker, stride, self.max_nonce);
                        loop {
                            let next_nonce = match search.state() {
                                MiningState::Searching { next_nonce } => *next_nonce,
                                _ => break,
                            };
                            if found.load(Ordering::Acquire)
                                && next_nonce > best_nonce.load(Ordering::Acquire)
                            {
                                // Superseded by a lower hit elsewhere
                                break;
                            }
                            if cancel.load(Ordering::Relaxed) {
                                search.cancel();
                                break;
                            }
                            if let MiningState::Found { nonce, .. } = search.step() {
                                best_nonce.fetch_min(*nonce, Ordering::AcqRel);
                                found.store(true, Ordering::Release);
                                break;
                            }
                        }
                        let attempts = search.attempts();
                        (search.into_state(), attempts)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(join_worker)
                .collect()
        });

        let attempts = outcomes.iter().map(|(_, a)| a).sum();

        if outcomes
            .iter()
            .any(|(state, _)| matches!(state, MiningState::Cancelled { .. }))
        {
            return MiningReport {
                state: MiningState::Cancelled { attempts },
                attempts,
            };
        }

        let winner = outcomes
            .into_iter()
            .filter_map(|(state, _)| match state {
                MiningState::Found { nonce, digest } => Some((nonce, digest)),
                _ => None,
            })
            .min_by_key(|(nonce, _)| *nonce);

        let state = match winner {
            Some((nonce, digest)) => MiningState::Found { nonce, digest },
            None => MiningState::Exhausted { attempts },
        };
        MiningReport { state, attempts }
    }
}

/// Join a search worker, re-raising its panic on the calling thread.
///
/// A lost worker may have owned the lowest nonce, so its result cannot be
/// replaced by a default.
fn join_worker<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(outcome) => outcome,
        Err(payload) => {
            tracing::error!("PoW search worker panicked");
            std::panic::resume_unwind(payload)
        }
    }
}
