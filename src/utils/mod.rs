// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/utils/mod.rs
// Version: 1.1.0
//
// This file is the module declaration for utility functions in the BMX miner,
// located in the utils subdirectory. It declares submodules for shared utility
// logic used across the project.
//
// Tree Location:
// - src/utils/mod.rs (utils module entry point)
// - Submodules: format, logging

pub mod format;
pub mod logging;

// Changelog:
// - v1.1.0: Added logging submodule for log4rs setup.
// - v1.0.0: Formatting helpers for hashrate, durations and numbers.
