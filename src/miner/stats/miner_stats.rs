// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/stats/miner_stats.rs
// Version: 1.1.0
//
// This file implements session-wide statistics for the BMX miner, located in
// the stats subdirectory of the miner module. It aggregates the per-worker
// counters and renders the periodic progress dashboard.
//
// Tree Location:
// - src/miner/stats/miner_stats.rs (session statistics logic)
// - Depends on: log, thread_stats

use super::thread_stats::ThreadStats;
use crate::utils::format::FormatUtils;
use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};

const LOG_TARGET: &str = "bmx::miner::stats";

pub struct MinerStats {
    start_time: Instant,
    pub thread_stats: Vec<Arc<ThreadStats>>,
}

impl MinerStats {
    pub fn new(num_workers: usize) -> Self {
        let thread_stats = (0..num_workers)
            .map(|i| Arc::new(ThreadStats::new(i)))
            .collect();

        Self {
            start_time: Instant::now(),
            thread_stats,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Attempts completed by all workers
    pub fn total_hashes(&self) -> u64 {
        self.thread_stats.iter().map(|t| t.hashes()).sum()
    }

    pub fn get_total_hashrate(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_hashes() as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_active_thread_count(&self) -> usize {
        self.thread_stats
            .iter()
            .filter(|t| t.get_hashrate() > 0.0)
            .count()
    }

    /// Log a short progress dashboard
    pub fn display_dashboard(&self) {
        for thread in &self.thread_stats {
            let rate = thread.update_hashrate();
            debug!(target: LOG_TARGET, "Worker {}: {} ({} hashes)", thread.worker_id(), FormatUtils::format_hashrate(rate), thread.hashes());
        }
        let total_hashes = self.total_hashes();
        let highest_nonce = self
            .thread_stats
            .iter()
            .filter(|t| t.hashes() > 0)
            .map(|t| t.last_nonce.load(std::sync::atomic::Ordering::Relaxed))
            .max()
            .unwrap_or(0);

        info!(target: LOG_TARGET, "📊 MINING PROGRESS");
        info!(target: LOG_TARGET, "├─ Hashrate: {}", FormatUtils::format_hashrate(self.get_total_hashrate()));
        info!(target: LOG_TARGET, "├─ Total Work: {} hashes", FormatUtils::format_number(total_hashes));
        info!(target: LOG_TARGET, "├─ Highest Nonce: {}", highest_nonce);
        info!(target: LOG_TARGET, "├─ Session Time: {}", FormatUtils::format_elapsed(self.elapsed()));
        info!(target: LOG_TARGET, "└─ Active Workers: {}/{}", self.get_active_thread_count(), self.thread_stats.len());
    }
}


// Changelog:
// - v1.1.0: Reduced to hash accounting for single-round sessions; share,
//   luck and difficulty panels removed.
// - v1.0.3: Fixed Top 5 Shares sorting.
// - v1.0.0: Extracted from monolithic main.rs.
