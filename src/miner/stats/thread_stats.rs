// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/stats/thread_stats.rs
// Version: 1.1.0
//
// This file implements per-worker statistics tracking for the BMX miner,
// located in the stats subdirectory of the miner module. It counts attempts
// and tracks the last nonce each worker has tried.
//
// Tree Location:
// - src/miner/stats/thread_stats.rs (per-worker statistics logic)
// - Depends on: std

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct ThreadStats {
    worker_id: usize,
    pub hashes_computed: AtomicU64,
    pub last_nonce: AtomicU64,
    start_time: Instant,
    current_hashrate: Mutex<f64>,
}

impl ThreadStats {
    /// Create a new ThreadStats instance for a specific worker
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            hashes_computed: AtomicU64::new(0),
            last_nonce: AtomicU64::new(0),
            start_time: Instant::now(),
            current_hashrate: Mutex::new(0.0),
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Record one completed attempt
    pub fn record_attempt(&self, nonce: u64) {
        self.hashes_computed.fetch_add(1, Ordering::Relaxed);
        self.last_nonce.store(nonce, Ordering::Relaxed);
    }

    pub fn hashes(&self) -> u64 {
        self.hashes_computed.load(Ordering::Relaxed)
    }

    /// Recompute hashrate from the attempts recorded so far
    pub fn update_hashrate(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        let current_rate = self.hashes() as f64 / elapsed;

        if let Ok(mut rate) = self.current_hashrate.lock() {
            *rate = current_rate;
        }
        current_rate
    }

    /// Get the current hashrate
    pub fn get_hashrate(&self) -> f64 {
        self.current_hashrate.lock().map(|rate| *rate).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_attempts() {
        let stats = ThreadStats::new(3);
        stats.record_attempt(3);
        stats.record_attempt(7);
        assert_eq!(stats.worker_id(), 3);
        assert_eq!(stats.hashes(), 2);
        assert_eq!(stats.last_nonce.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn test_update_hashrate_caches_rate() {
        let stats = ThreadStats::new(0);
        for nonce in 0..1000 {
            stats.record_attempt(nonce);
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
        let rate = stats.update_hashrate();
        assert!(rate > 0.0);
        assert_eq!(stats.get_hashrate(), rate);
    }
}

// Changelog:
// - v1.1.0: Per-worker attempt counting with last nonce tracking; share
//   bookkeeping and peak hashrate removed since a session ends at its first
//   solution.
// - v1.0.1: Added peak hashrate tracking for benchmarking.
// - v1.0.0: Initial per-thread statistics.
