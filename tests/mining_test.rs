// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: tests/mining_test.rs
// Version: 1.0.0
//
// End-to-end tests for mining sessions: solutions, nonce order, cancellation,
// failure propagation and the single release of the scratchpad.
//
// Tree Location:
// - tests/mining_test.rs (mining session integration tests)
// - Depends on: core, miner, error

use bmx_miner::core::candidate::{build, nonce_of};
use bmx_miner::core::difficulty::parse_target;
use bmx_miner::core::scratchpad::{HeapAllocator, RegionAllocator};
use bmx_miner::core::types::Args;
use bmx_miner::{
    Digest256, Miner, MinerConfig, MinerError, PowHasher, Result, ScratchpadLayout,
    ScratchpadMode, SessionHandle, SessionState, Sha256Hasher, U256,
};
use clap::Parser;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

const REFERENCE_TARGET: &str = "0x00000FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF";

/// Heap allocator that counts reservations and reclaims
#[derive(Default)]
struct TrackingAllocator {
    reserved: AtomicUsize,
    reclaimed: AtomicUsize,
}

impl TrackingAllocator {
    fn reserved(&self) -> usize {
        self.reserved.load(Ordering::SeqCst)
    }

    fn reclaimed(&self) -> usize {
        self.reclaimed.load(Ordering::SeqCst)
    }
}

impl RegionAllocator for TrackingAllocator {
    fn reserve(&self, words: usize) -> Result<Vec<u64>> {
        let region = HeapAllocator.reserve(words)?;
        self.reserved.fetch_add(1, Ordering::SeqCst);
        Ok(region)
    }

    fn reclaim(&self, region: Vec<u64>) {
        self.reclaimed.fetch_add(1, Ordering::SeqCst);
        HeapAllocator.reclaim(region);
    }
}

/// Records every nonce it sees and succeeds once `winner` comes up
struct RecordingHasher {
    seen: Mutex<Vec<u64>>,
    winner: u64,
}

impl PowHasher for RecordingHasher {
    fn digest(&self, candidate: &[u8]) -> Result<Digest256> {
        let nonce = nonce_of(candidate).expect("candidate carries a nonce");
        self.seen.lock().unwrap().push(nonce);
        if nonce == self.winner {
            Ok(Digest256::from_bytes([0u8; 32]))
        } else {
            Ok(Digest256::from_bytes([0xFF; 32]))
        }
    }
}

struct FailingHasher;

impl PowHasher for FailingHasher {
    fn digest(&self, _candidate: &[u8]) -> Result<Digest256> {
        Err(MinerError::HashComputation("primitive unavailable".to_string()))
    }
}

fn small_config(bytes: usize, threads: usize) -> MinerConfig {
    MinerConfig::new(ScratchpadMode::Light)
        .with_layout(ScratchpadLayout::custom(bytes).unwrap())
        .with_threads(threads)
        .with_report_interval(Duration::from_secs(1))
}

#[test]
fn test_reference_target_solution_verifies() {
    let target = parse_target(REFERENCE_TARGET).unwrap();
    let allocator = Arc::new(TrackingAllocator::default());
    let miner = Miner::new(small_config(64, 4)).with_allocator(allocator.clone());

    let result = miner.mine(target).unwrap();

    // Recompute from a fresh zeroed region of the same size
    let words = vec![0u64; 8];
    let candidate = build(&words, result.nonce);
    let recomputed = Sha256Hasher.digest(&candidate).unwrap();
    assert_eq!(recomputed, result.digest);
    assert!(recomputed.as_integer() < target);
    assert!(result.digest.to_hex().starts_with("00000"));
    assert_eq!(result.digest.to_hex().len(), 64);

    assert_eq!(allocator.reserved(), 1);
    assert_eq!(allocator.reclaimed(), 1);
}

#[test]
fn test_single_worker_tries_nonces_in_order() {
    let hasher = RecordingHasher {
        seen: Mutex::new(Vec::new()),
        winner: 5,
    };
    let miner = Miner::new(small_config(16, 1)).with_hasher(hasher);
    let session = miner.start().unwrap();
    let result = session.mine(U256::MAX).unwrap();

    assert_eq!(result.nonce, 5);
    assert_eq!(result.hashes, 6);
}

#[test]
fn test_recording_hasher_sees_increasing_nonces() {
    let hasher = Arc::new(RecordingHasher {
        seen: Mutex::new(Vec::new()),
        winner: 9,
    });

    struct Shared(Arc<RecordingHasher>);
    impl PowHasher for Shared {
        fn digest(&self, candidate: &[u8]) -> Result<Digest256> {
            self.0.digest(candidate)
        }
    }

    let miner = Miner::new(small_config(8, 1)).with_hasher(Shared(hasher.clone()));
    miner.mine(U256::MAX).unwrap();

    let seen = hasher.seen.lock().unwrap().clone();
    assert_eq!(seen, (0..=9).collect::<Vec<u64>>());
}

#[test]
fn test_stop_cancels_unreachable_target_and_releases_once() {
    let allocator = Arc::new(TrackingAllocator::default());
    let miner = Miner::new(small_config(64, 2)).with_allocator(allocator.clone());
    let session = miner.start().unwrap();
    let handle = session.handle();
    assert_eq!(handle.state(), SessionState::Running);

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.stop();
    });

    let outcome = session.mine(U256::zero());
    stopper.join().unwrap();

    assert!(matches!(outcome, Err(MinerError::Cancelled)));
    assert_eq!(allocator.reserved(), 1);
    assert_eq!(allocator.reclaimed(), 1);
}

#[test]
fn test_invalid_mode_fails_before_allocation() {
    let args = Args::try_parse_from(["bmx", "--mode", "medium"]).unwrap();
    let err = args.miner_config().unwrap_err();
    assert!(matches!(err, MinerError::InvalidMode(ref m) if m == "medium"));
}

#[test]
fn test_hash_failure_propagates_and_releases() {
    let allocator = Arc::new(TrackingAllocator::default());
    let miner = Miner::new(small_config(32, 2))
        .with_hasher(FailingHasher)
        .with_allocator(allocator.clone());
    let session = miner.start().unwrap();
    let handle = session.handle();

    let err = session.mine(U256::MAX).unwrap_err();
    assert!(matches!(err, MinerError::HashComputation(_)));
    assert_eq!(handle.state(), SessionState::Stopped);
    assert_eq!(allocator.reclaimed(), 1);
}

#[test]
fn test_many_workers_report_one_solution() {
    let miner = Miner::new(small_config(32, 8));
    let session = miner.start().unwrap();
    let handle = session.handle();

    let result = session.mine(U256::MAX).unwrap();

    // Every worker's first nonce succeeds; only one of them wins
    assert!(result.nonce < 8);
    assert_eq!(result.nonce, result.worker_id as u64);
    assert_eq!(handle.state(), SessionState::Succeeded);
}

#[test]
fn test_stop_without_mining_releases_once() {
    let allocator = Arc::new(TrackingAllocator::default());
    let miner = Miner::new(small_config(32, 1)).with_allocator(allocator.clone());
    let session = miner.start().unwrap();
    let handle = session.handle();

    session.stop().unwrap();

    assert_eq!(handle.state(), SessionState::Stopped);
    assert!(handle.is_stop_requested());
    assert_eq!(allocator.reclaimed(), 1);
}

#[test]
fn test_dropped_session_releases_once() {
    let allocator = Arc::new(TrackingAllocator::default());
    let miner = Miner::new(small_config(32, 1)).with_allocator(allocator.clone());
    let session = miner.start().unwrap();
    let handle = session.handle();

    drop(session);

    assert_eq!(handle.state(), SessionState::Stopped);
    assert_eq!(allocator.reclaimed(), 1);
}

#[test]
fn test_stop_before_start_skips_allocation() {
    let allocator = Arc::new(TrackingAllocator::default());
    let miner = Miner::new(small_config(32, 1)).with_allocator(allocator.clone());
    let handle = SessionHandle::new();
    handle.stop();

    let err = miner.start_with_handle(handle.clone()).unwrap_err();
    assert!(matches!(err, MinerError::Cancelled));
    assert_eq!(allocator.reserved(), 0);
    assert_eq!(handle.state(), SessionState::Idle);
}

#[test]
fn test_handle_cannot_be_reused() {
    let miner = Miner::new(small_config(32, 1));
    let handle = SessionHandle::new();
    miner.start_with_handle(handle.clone()).unwrap().mine(U256::MAX).unwrap();
    assert_eq!(handle.state(), SessionState::Succeeded);

    let err = miner.start_with_handle(handle).unwrap_err();
    assert!(matches!(err, MinerError::HandleInUse(_)));
    assert!(err.is_logic_fault());
}

#[test]
fn test_candidate_reservation_failure_releases_scratchpad() {
    let allocator = Arc::new(TrackingAllocator::default());
    let miner = Miner::new(small_config(64, usize::MAX)).with_allocator(allocator.clone());
    let handle = SessionHandle::new();

    let err = miner.start_with_handle(handle.clone()).unwrap_err();
    assert!(matches!(err, MinerError::Allocation { .. }));
    assert_eq!(allocator.reserved(), 1);
    assert_eq!(allocator.reclaimed(), 1);
    assert_eq!(handle.state(), SessionState::Idle);
}

#[test]
fn test_concurrent_starts_on_one_handle() {
    let allocator = Arc::new(TrackingAllocator::default());
    let miner = Arc::new(Miner::new(small_config(64, 1)).with_allocator(allocator.clone()));
    let handle = SessionHandle::new();
    let barrier = Arc::new(Barrier::new(2));

    let starters: Vec<_> = (0..2)
        .map(|_| {
            let (miner, handle, barrier) = (miner.clone(), handle.clone(), barrier.clone());
            thread::spawn(move || {
                barrier.wait();
                miner.start_with_handle(handle)
            })
        })
        .collect();
    let outcomes: Vec<_> = starters.into_iter().map(|t| t.join().unwrap()).collect();

    let (sessions, refused): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(|o| o.is_ok());
    assert_eq!(sessions.len(), 1);
    assert!(matches!(refused[0], Err(MinerError::HandleInUse(_))));
    assert_eq!(handle.state(), SessionState::Running);

    for session in sessions {
        session.unwrap().stop().unwrap();
    }
    assert_eq!(allocator.reclaimed(), allocator.reserved());
}

#[test]
fn test_light_mode_single_round() {
    // Any digest is below the maximum target, so nonce 0 wins on a full scratchpad
    let (digest_hex, nonce) = bmx_miner::mine(ScratchpadMode::Light, U256::MAX).unwrap();
    assert_eq!(nonce, 0);
    assert_eq!(digest_hex.len(), 64);
    assert!(digest_hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}
