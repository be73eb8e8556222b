// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/cpu/miner.rs
// Version: 3.1.0
//
// This file contains the mining controller. A `Miner` holds configuration,
// hash primitive and memory source; `start` allocates the scratchpad and
// yields a `MiningSession` that owns it until `mine` or `stop` consumes the
// session and releases the region.

use crate::core::candidate::{CandidateBuilder, candidate_len};
use crate::core::difficulty::{U256, expected_attempts, leading_zero_bits};
use crate::core::digest::{Digest256, PowHasher, Sha256Hasher};
use crate::core::scratchpad::{HeapAllocator, RegionAllocator, Scratchpad, ScratchpadMode};
use crate::core::types::{MinerConfig, MiningResult};
use crate::error::{MinerError, Result};
use crate::miner::session::{SessionHandle, SessionState};
use crate::miner::stats::MinerStats;
use crate::utils::format::FormatUtils;
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::thread::{WorkerContext, WorkerEvent, run_worker};

const LOG_TARGET: &str = "bmx::miner::cpu";

const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Winning attempt as decided by the controller
#[derive(Debug)]
struct Solution {
    worker_id: usize,
    nonce: u64,
    digest: Digest256,
}

pub struct Miner<H: PowHasher = Sha256Hasher> {
    config: MinerConfig,
    hasher: Arc<H>,
    allocator: Arc<dyn RegionAllocator>,
    start_nonce: u64,
}

impl Miner<Sha256Hasher> {
    pub fn new(config: MinerConfig) -> Self {
        Self {
            config,
            hasher: Arc::new(Sha256Hasher),
            allocator: Arc::new(HeapAllocator),
            start_nonce: 0,
        }
    }
}

impl<H: PowHasher> Miner<H> {
    /// Swap the hash primitive
    pub fn with_hasher<G: PowHasher>(self, hasher: G) -> Miner<G> {
        Miner {
            config: self.config,
            hasher: Arc::new(hasher),
            allocator: self.allocator,
            start_nonce: self.start_nonce,
        }
    }

    /// Swap the memory source of the scratchpad
    pub fn with_allocator(mut self, allocator: Arc<dyn RegionAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Begin the nonce sequence somewhere other than zero
    #[cfg(test)]
    pub(crate) fn with_start_nonce(mut self, nonce: u64) -> Self {
        self.start_nonce = nonce;
        self
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Idle -> Running: allocate the scratchpad and open a session.
    pub fn start(&self) -> Result<MiningSession<H>> {
        self.start_with_handle(SessionHandle::new())
    }

    /// Like `start`, with a handle the caller created beforehand so a stop
    /// can be requested while the scratchpad is still being allocated.
    pub fn start_with_handle(&self, handle: SessionHandle) -> Result<MiningSession<H>> {
        if handle.state() != SessionState::Idle {
            warn!(target: LOG_TARGET, "Refusing to start with a handle in state {}", handle.state());
            return Err(MinerError::HandleInUse(handle.state().to_string()));
        }
        if handle.is_stop_requested() {
            info!(target: LOG_TARGET, "Stop requested before start, not allocating");
            return Err(MinerError::Cancelled);
        }

        let workers = self.config.worker_count().max(1);
        info!(target: LOG_TARGET, "🚀 Starting BMX session");
        info!(target: LOG_TARGET, "├─ Mode: {}", self.config.mode);
        info!(target: LOG_TARGET, "├─ Scratchpad: {}", FormatUtils::format_bytes(self.config.layout.bytes()));
        info!(target: LOG_TARGET, "└─ Workers: {}", workers);

        let mut scratchpad = Scratchpad::allocate_with(self.config.layout, Arc::clone(&self.allocator))?;
        let builders = match reserve_candidate_buffers(self.config.layout.words(), workers) {
            Ok(builders) => builders,
            Err(e) => {
                error!(target: LOG_TARGET, "❌ Candidate buffers for {} workers unavailable: {}", workers, e);
                scratchpad.release()?;
                return Err(e);
            }
        };

        // Another start may have claimed the handle while we were allocating
        if !handle.transition(SessionState::Running) {
            let state = handle.state();
            warn!(target: LOG_TARGET, "Handle moved to {} during start, releasing", state);
            scratchpad.release()?;
            return Err(MinerError::HandleInUse(state.to_string()));
        }

        Ok(MiningSession {
            report_interval: self.config.report_interval,
            start_nonce: self.start_nonce,
            hasher: Arc::clone(&self.hasher),
            scratchpad,
            builders,
            handle,
            stats: Arc::new(MinerStats::new(workers)),
        })
    }

    /// One full round: start, mine, release.
    pub fn mine(&self, target: U256) -> Result<MiningResult> {
        self.start()?.mine(target)
    }
}

/// One candidate buffer per worker, reserved before the session starts running.
fn reserve_candidate_buffers(words: usize, workers: usize) -> Result<Vec<CandidateBuilder>> {
    let total = candidate_len(words).and_then(|bytes| bytes.checked_mul(workers));
    let Some(total) = total else {
        return Err(MinerError::Allocation {
            bytes: usize::MAX,
            source: None,
        });
    };
    debug!(target: LOG_TARGET, "Reserving {} for {} candidate buffers", FormatUtils::format_bytes(total), workers);

    let mut builders = Vec::new();
    builders
        .try_reserve_exact(workers)
        .map_err(|e| MinerError::Allocation {
            bytes: total,
            source: Some(e),
        })?;
    for _ in 0..workers {
        builders.push(CandidateBuilder::new(words)?);
    }
    Ok(builders)
}

/// A running session that owns its scratchpad
pub struct MiningSession<H: PowHasher = Sha256Hasher> {
    report_interval: Duration,
    start_nonce: u64,
    hasher: Arc<H>,
    scratchpad: Scratchpad,
    builders: Vec<CandidateBuilder>,
    handle: SessionHandle,
    stats: Arc<MinerStats>,
}

impl<H: PowHasher> MiningSession<H> {
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Search for a nonce whose digest is strictly below `target`.
    ///
    /// The scratchpad is released before this returns, whatever the outcome.
    pub fn mine(mut self, target: U256) -> Result<MiningResult> {
        match expected_attempts(&target) {
            Some(attempts) => info!(target: LOG_TARGET, "🎯 Target {:064x} (~{} attempts expected)", target, attempts),
            None => warn!(target: LOG_TARGET, "🎯 Target is zero: mining until stopped"),
        }

        let started = Instant::now();
        let outcome = self.search(&target);
        let elapsed = started.elapsed();
        let hashes = self.stats.total_hashes();

        let released = self.scratchpad.release();

        match outcome {
            Ok(solution) => {
                if let Err(e) = released {
                    self.handle.transition(SessionState::Stopped);
                    return Err(e);
                }
                self.handle.transition(SessionState::Succeeded);
                info!(target: LOG_TARGET, "Block mined with nonce: {}", solution.nonce);
                info!(target: LOG_TARGET, "Hash: {} ({} leading zero bits)", solution.digest, leading_zero_bits(solution.digest.as_bytes()));
                info!(target: LOG_TARGET, "Time taken: {} ({} hashes)", FormatUtils::format_elapsed(elapsed), hashes);
                Ok(MiningResult {
                    digest: solution.digest,
                    nonce: solution.nonce,
                    elapsed,
                    hashes,
                    worker_id: solution.worker_id,
                })
            }
            Err(e) => {
                self.handle.transition(SessionState::Stopped);
                if let Err(release_error) = released {
                    error!(target: LOG_TARGET, "Scratchpad release failed after '{}': {}", e, release_error);
                }
                info!(target: LOG_TARGET, "Session ended without a solution after {} hashes: {}", hashes, e);
                Err(e)
            }
        }
    }

    /// Running -> Stopped without mining.
    pub fn stop(mut self) -> Result<()> {
        self.handle.stop();
        let released = self.scratchpad.release();
        self.handle.transition(SessionState::Stopped);
        released
    }

    fn search(&mut self, target: &U256) -> Result<Solution> {
        let builders = std::mem::take(&mut self.builders);
        let words = self.scratchpad.words()?;
        let workers = self.stats.thread_stats.len();
        let stride = workers as u64;
        let halt = AtomicBool::new(false);
        let cancel = self.handle.stop_flag();
        let hasher: &H = &self.hasher;
        let stats = &self.stats;
        let (event_tx, event_rx) = channel::unbounded::<WorkerEvent>();

        let decided = crossbeam::thread::scope(|scope| {
            for (worker_id, builder) in builders.into_iter().enumerate() {
                let event_tx = event_tx.clone();
                let Some(first_nonce) = self.start_nonce.checked_add(worker_id as u64) else {
                    let _ = event_tx.send(WorkerEvent::Exhausted {
                        worker_id,
                        last_nonce: u64::MAX,
                    });
                    continue;
                };
                let ctx = WorkerContext {
                    worker_id,
                    first_nonce,
                    stride,
                    words,
                    target,
                    hasher,
                    halt: &halt,
                    cancel,
                    stats: &stats.thread_stats[worker_id],
                };
                scope.spawn(move |_| {
                    let event = run_worker(ctx, builder);
                    let _ = event_tx.send(event);
                });
            }
            drop(event_tx);

            self.collect(&event_rx, &halt, cancel, workers)
        })
        .map_err(|_| MinerError::WorkerPanicked("scoped worker did not join".to_string()))?;
        decided
    }

    /// Wait for every worker; the first solution or failure decides the session.
    fn collect(
        &self,
        events: &Receiver<WorkerEvent>,
        halt: &AtomicBool,
        cancel: &AtomicBool,
        workers: usize,
    ) -> Result<Solution> {
        let mut decision: Option<Result<Solution>> = None;
        let mut exhausted = 0usize;
        let interval = self.report_interval.max(MIN_REPORT_INTERVAL);
        let mut last_report = Instant::now();

        loop {
            let wait = interval.saturating_sub(last_report.elapsed());
            let event = match events.recv_timeout(wait) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => {
                    self.stats.display_dashboard();
                    last_report = Instant::now();
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let verdict = match event {
                WorkerEvent::Found {
                    worker_id,
                    nonce,
                    digest,
                } => Some(Ok(Solution {
                    worker_id,
                    nonce,
                    digest,
                })),
                WorkerEvent::Failed { error, .. } => Some(Err(error)),
                WorkerEvent::Panicked { worker_id, message } => Some(Err(MinerError::WorkerPanicked(
                    format!("worker {}: {}", worker_id, message),
                ))),
                WorkerEvent::Exhausted { worker_id, last_nonce } => {
                    debug!(target: LOG_TARGET, "Worker {} exhausted its nonces at {}", worker_id, last_nonce);
                    exhausted += 1;
                    None
                }
                WorkerEvent::Halted { worker_id } => {
                    debug!(target: LOG_TARGET, "Worker {} halted", worker_id);
                    None
                }
            };

            if let Some(verdict) = verdict {
                if decision.is_none() {
                    halt.store(true, Ordering::Release);
                    decision = Some(verdict);
                } else if let Ok(late) = verdict {
                    debug!(target: LOG_TARGET, "Discarding later solution from worker {} at nonce {}", late.worker_id, late.nonce);
                }
            }
        }

        match decision {
            Some(decided) => decided,
            None if cancel.load(Ordering::Acquire) => Err(MinerError::Cancelled),
            None if exhausted == workers => Err(MinerError::NonceSpaceExhausted),
            None => Err(MinerError::Cancelled),
        }
    }
}

impl<H: PowHasher> fmt::Debug for MiningSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiningSession")
            .field("scratchpad", &self.scratchpad)
            .field("workers", &self.stats.thread_stats.len())
            .field("start_nonce", &self.start_nonce)
            .field("handle", &self.handle)
            .finish()
    }
}

impl<H: PowHasher> Drop for MiningSession<H> {
    fn drop(&mut self) {
        if !self.scratchpad.is_released() {
            debug!(target: LOG_TARGET, "Session dropped while running, releasing scratchpad");
            let _ = self.scratchpad.release();
            self.handle.transition(SessionState::Stopped);
        }
    }
}

/// Mine one round with the default SHA-256 hasher and a single worker.
///
/// Returns the winning digest as lowercase hex and the nonce.
pub fn mine(mode: ScratchpadMode, target: U256) -> Result<(String, u64)> {
    let result = Miner::new(MinerConfig::new(mode)).mine(target)?;
    Ok((result.digest.to_hex(), result.nonce))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scratchpad::ScratchpadLayout;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingAllocator {
        reclaimed: AtomicUsize,
    }

    impl RegionAllocator for CountingAllocator {
        fn reserve(&self, words: usize) -> Result<Vec<u64>> {
            HeapAllocator.reserve(words)
        }

        fn reclaim(&self, region: Vec<u64>) {
            self.reclaimed.fetch_add(1, Ordering::SeqCst);
            drop(region);
        }
    }

    fn tiny_miner(threads: usize, allocator: Arc<CountingAllocator>) -> Miner {
        let config = MinerConfig::new(ScratchpadMode::Light)
            .with_layout(ScratchpadLayout::custom(16).unwrap())
            .with_threads(threads);
        Miner::new(config).with_allocator(allocator)
    }

    #[test]
    fn test_session_fails_when_nonces_run_out() {
        let allocator = Arc::new(CountingAllocator::default());
        let miner = tiny_miner(2, allocator.clone()).with_start_nonce(u64::MAX - 3);
        let session = miner.start().unwrap();
        let handle = session.handle();

        let err = session.mine(U256::zero()).unwrap_err();
        assert!(matches!(err, MinerError::NonceSpaceExhausted));
        assert_eq!(handle.state(), SessionState::Stopped);
        assert_eq!(allocator.reclaimed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_past_the_last_nonce_counts_as_exhausted() {
        let allocator = Arc::new(CountingAllocator::default());
        let miner = tiny_miner(3, allocator.clone()).with_start_nonce(u64::MAX);
        let session = miner.start().unwrap();
        let stats = Arc::clone(&session.stats);

        let err = session.mine(U256::zero()).unwrap_err();
        assert!(matches!(err, MinerError::NonceSpaceExhausted));
        assert_eq!(stats.total_hashes(), 1, "only u64::MAX itself is tried");
        assert_eq!(allocator.reclaimed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_candidate_buffers_sized_per_worker() {
        let builders = reserve_candidate_buffers(4, 3).unwrap();
        assert_eq!(builders.len(), 3);
        assert!(builders.iter().all(|b| b.capacity() >= 40));

        let err = reserve_candidate_buffers(4, usize::MAX).unwrap_err();
        assert!(matches!(err, MinerError::Allocation { source: None, .. }));
    }

    #[test]
    fn test_session_debug_names_workers() {
        let allocator = Arc::new(CountingAllocator::default());
        let session = tiny_miner(2, allocator).start().unwrap();
        let text = format!("{:?}", session);
        assert!(text.contains("MiningSession"));
        assert!(text.contains("workers: 2"));
        session.stop().unwrap();
    }
}

// Changelog:
// - v3.1.0: Candidate buffers are reserved with the scratchpad before the
//   session runs; the Running transition gates start.
// - v3.0.0: Replaced the pool-driven CPU miner with a single-round controller.
//   - Sessions own the scratchpad; mine() and stop() consume the session and
//     release the region exactly once on every exit path.
//   - Workers run on crossbeam scoped threads and report over a channel; the
//     first solution wins and halts the rest.
// - v2.0.4-dns: Added DNS resolution support.
