// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/cpu/mod.rs
// Version: 1.1.0
//
// This file is the module declaration for the CPU mining functionality of the
// BMX miner, located in the cpu subdirectory of the miner module. It declares
// submodules and re-exports key types for use throughout the project.
//
// Tree Location:
// - src/miner/cpu/mod.rs (CPU miner module entry point)
// - Submodules: miner, thread

pub mod miner;
pub mod thread;

// Re-export key types for convenience
pub use miner::{Miner, MiningSession, mine};
