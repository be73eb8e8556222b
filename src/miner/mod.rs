// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/mod.rs
// Version: 2.0.0
//
// This file is the module declaration for the miner functionality of the BMX
// miner, located in the miner subdirectory. It declares submodules and re-exports
// key types for use throughout the project.
//
// Tree Location:
// - src/miner/mod.rs (miner module entry point)
// - Submodules: cpu, session, stats

pub mod cpu;
pub mod session;
pub mod stats;

// Re-export key types for convenience
pub use cpu::{Miner, MiningSession, mine};
pub use session::{SessionHandle, SessionState};
pub use stats::{MinerStats, ThreadStats};

// Changelog:
// - v2.0.0: Added the session state machine; GPU module removed.
// - v1.0.0: Extracted from monolithic main.rs.
