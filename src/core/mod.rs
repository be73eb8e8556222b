// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/mod.rs
// Version: 1.0.0
//
// This file is the module declaration for the core functionality of the BMX
// miner, located in the core subdirectory. It declares submodules and re-exports
// key types for use throughout the project.

pub mod candidate;
pub mod difficulty;
pub mod digest;
pub mod scratchpad;
pub mod types;

// Re-export the most commonly used items
pub use candidate::{CandidateBuilder, build};
pub use difficulty::{U256, expected_attempts, parse_target, target_from_leading_zero_bits};
pub use digest::{Digest256, PowHasher, Sha256Hasher, as_integer, meets_target};
pub use scratchpad::{HeapAllocator, RegionAllocator, Scratchpad, ScratchpadLayout, ScratchpadMode};
pub use types::{Args, MinerConfig, MiningReport, MiningResult};
