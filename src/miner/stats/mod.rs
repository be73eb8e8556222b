// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/stats/mod.rs
// Version: 1.0.1
//
// This file is the module declaration for the statistics tracking functionality
// of the BMX miner, located in the stats subdirectory of the miner module. It
// declares submodules and re-exports key types for use throughout the project.
//
// Tree Location:
// - src/miner/stats/mod.rs (stats module entry point)
// - Submodules: miner_stats, thread_stats

pub mod miner_stats;
pub mod thread_stats;

// Re-export key types for convenience
pub use miner_stats::MinerStats;
pub use thread_stats::ThreadStats;
