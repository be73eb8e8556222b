// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/cpu/thread.rs
// Version: 1.3.0
//
// This file contains the implementation of individual mining workers for the
// BMX miner, located in the cpu subdirectory of the miner module. It handles
// nonce iteration, candidate construction, hashing and solution detection.

use crate::core::candidate::CandidateBuilder;
use crate::core::difficulty::U256;
use crate::core::digest::{Digest256, PowHasher, meets_target};
use crate::error::MinerError;
use crate::miner::stats::ThreadStats;
use log::{debug, error, info, trace};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

const LOG_TARGET: &str = "bmx::miner::thread";

/// What a worker reports when it stops
#[derive(Debug)]
pub enum WorkerEvent {
    Found {
        worker_id: usize,
        nonce: u64,
        digest: Digest256,
    },
    Failed {
        worker_id: usize,
        error: MinerError,
    },
    Exhausted {
        worker_id: usize,
        last_nonce: u64,
    },
    Halted {
        worker_id: usize,
    },
    Panicked {
        worker_id: usize,
        message: String,
    },
}

/// Borrowed state one worker needs for a session
pub struct WorkerContext<'a, H: PowHasher + ?Sized> {
    pub worker_id: usize,
    /// First nonce this worker tries
    pub first_nonce: u64,
    /// Distance between consecutive nonces of this worker (the worker count)
    pub stride: u64,
    pub words: &'a [u64],
    pub target: &'a U256,
    pub hasher: &'a H,
    /// Set by the controller once the session outcome is decided
    pub halt: &'a AtomicBool,
    /// Set by an external stop request
    pub cancel: &'a AtomicBool,
    pub stats: &'a ThreadStats,
}

impl<H: PowHasher + ?Sized> WorkerContext<'_, H> {
    fn should_stop(&self) -> bool {
        self.halt.load(Ordering::Acquire) || self.cancel.load(Ordering::Acquire)
    }
}

/// Next nonce for a worker, `None` once the 64-bit space is used up.
pub fn next_nonce(nonce: u64, stride: u64) -> Option<u64> {
    nonce.checked_add(stride)
}

/// Run a worker to completion, converting a panic into an event.
///
/// `builder` must have been reserved for `ctx.words`; the loop never grows it.
pub fn run_worker<H: PowHasher + ?Sized>(
    ctx: WorkerContext<'_, H>,
    builder: CandidateBuilder,
) -> WorkerEvent {
    let worker_id = ctx.worker_id;
    match catch_unwind(AssertUnwindSafe(|| mining_thread(&ctx, builder))) {
        Ok(event) => event,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(target: LOG_TARGET, "Worker {}: panicked: {}", worker_id, message);
            WorkerEvent::Panicked { worker_id, message }
        }
    }
}

fn mining_thread<H: PowHasher + ?Sized>(
    ctx: &WorkerContext<'_, H>,
    mut builder: CandidateBuilder,
) -> WorkerEvent {
    let worker_id = ctx.worker_id;
    let mut nonce = ctx.first_nonce;

    debug!(target: LOG_TARGET, "Worker {}: starting at nonce {} with stride {}", worker_id, nonce, ctx.stride);

    loop {
        if ctx.should_stop() {
            debug!(target: LOG_TARGET, "Worker {}: halted before nonce {}", worker_id, nonce);
            return WorkerEvent::Halted { worker_id };
        }

        let candidate = builder.build(ctx.words, nonce);
        let digest = match ctx.hasher.digest(candidate) {
            Ok(digest) => digest,
            Err(error) => {
                error!(target: LOG_TARGET, "Worker {}: hashing nonce {} failed: {}", worker_id, nonce, error);
                return WorkerEvent::Failed { worker_id, error };
            }
        };
        ctx.stats.record_attempt(nonce);
        trace!(target: LOG_TARGET, "Worker {}: nonce {} -> {}", worker_id, nonce, digest);

        if meets_target(&digest, ctx.target) {
            info!(target: LOG_TARGET, "💎 Worker {} found a solution at nonce {}", worker_id, nonce);
            return WorkerEvent::Found {
                worker_id,
                nonce,
                digest,
            };
        }

        nonce = match next_nonce(nonce, ctx.stride) {
            Some(next) => next,
            None => {
                error!(target: LOG_TARGET, "Worker {}: nonce space exhausted at {}", worker_id, nonce);
                return WorkerEvent::Exhausted {
                    worker_id,
                    last_nonce: nonce,
                };
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::Sha256Hasher;
    use crate::error::Result;

    struct ExplodingHasher;

    impl PowHasher for ExplodingHasher {
        fn digest(&self, _candidate: &[u8]) -> Result<Digest256> {
            panic!("primitive blew up");
        }
    }

    fn context<'a, H: PowHasher>(
        hasher: &'a H,
        words: &'a [u64],
        target: &'a U256,
        halt: &'a AtomicBool,
        cancel: &'a AtomicBool,
        stats: &'a ThreadStats,
    ) -> WorkerContext<'a, H> {
        WorkerContext {
            worker_id: 0,
            first_nonce: 0,
            stride: 1,
            words,
            target,
            hasher,
            halt,
            cancel,
            stats,
        }
    }

    fn builder(words: &[u64]) -> CandidateBuilder {
        CandidateBuilder::new(words.len()).unwrap()
    }

    #[test]
    fn test_next_nonce_refuses_to_wrap() {
        assert_eq!(next_nonce(0, 1), Some(1));
        assert_eq!(next_nonce(u64::MAX - 3, 4), None);
        assert_eq!(next_nonce(u64::MAX - 4, 4), Some(u64::MAX));
    }

    #[test]
    fn test_worker_finds_first_nonce_under_max_target() {
        let words = [0u64; 4];
        let target = U256::MAX;
        let (halt, cancel) = (AtomicBool::new(false), AtomicBool::new(false));
        let stats = ThreadStats::new(0);

        let event = run_worker(context(&Sha256Hasher, &words, &target, &halt, &cancel, &stats), builder(&words));
        match event {
            WorkerEvent::Found { nonce, .. } => assert_eq!(nonce, 0),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(stats.hashes(), 1);
    }

    #[test]
    fn test_worker_honours_cancel_before_hashing() {
        let words = [0u64; 4];
        let target = U256::zero();
        let (halt, cancel) = (AtomicBool::new(false), AtomicBool::new(true));
        let stats = ThreadStats::new(0);

        let event = run_worker(context(&Sha256Hasher, &words, &target, &halt, &cancel, &stats), builder(&words));
        assert!(matches!(event, WorkerEvent::Halted { worker_id: 0 }));
        assert_eq!(stats.hashes(), 0);
    }

    #[test]
    fn test_worker_stops_at_end_of_nonce_space() {
        let words = [0u64; 2];
        let target = U256::zero();
        let (halt, cancel) = (AtomicBool::new(false), AtomicBool::new(false));
        let stats = ThreadStats::new(0);
        let mut ctx = context(&Sha256Hasher, &words, &target, &halt, &cancel, &stats);
        ctx.first_nonce = u64::MAX - 2;

        let event = run_worker(ctx, builder(&words));
        match event {
            WorkerEvent::Exhausted { last_nonce, .. } => assert_eq!(last_nonce, u64::MAX),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(stats.hashes(), 3);
    }

    #[test]
    fn test_worker_panic_becomes_event() {
        let words = [0u64; 1];
        let target = U256::MAX;
        let (halt, cancel) = (AtomicBool::new(false), AtomicBool::new(false));
        let stats = ThreadStats::new(0);

        let event = run_worker(context(&ExplodingHasher, &words, &target, &halt, &cancel, &stats), builder(&words));
        match event {
            WorkerEvent::Panicked { message, .. } => assert!(message.contains("blew up")),
            other => panic!("unexpected event {:?}", other),
        }
    }
}

// Changelog:
// - v1.3.0: Candidate buffer is reserved by the controller and handed in;
//   the first nonce comes from the context.
// - v1.2.0: Workers stride through the nonce space from their id and stop on
//   the shared halt or cancel flags; nonces never wrap.
// - v1.1.4: Fixed SHA-256 share validation.
