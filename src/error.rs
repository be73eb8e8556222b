// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/error.rs
// Version: 1.0.0
//
// This file defines the error taxonomy shared by the scratchpad manager, the
// digest evaluator and the mining controller.

use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MinerError {
    #[error("Failed to reserve {bytes} bytes for the scratchpad")]
    Allocation {
        bytes: usize,
        #[source]
        source: Option<TryReserveError>,
    },

    #[error("Scratchpad of {bytes} bytes is not addressable on this platform")]
    UnsupportedPlatform { bytes: usize },

    #[error("Scratchpad was already released")]
    DoubleRelease,

    #[error("Hash computation failed: {0}")]
    HashComputation(String),

    #[error("Invalid scratchpad mode '{0}' (expected 'light' or 'fast')")]
    InvalidMode(String),

    #[error("Invalid scratchpad size {bytes}: must be non-zero and a multiple of 8 bytes")]
    InvalidLayout { bytes: usize },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Nonce space exhausted without finding a solution")]
    NonceSpaceExhausted,

    #[error("Session handle already used (state: {0})")]
    HandleInUse(String),

    #[error("Mining session was cancelled")]
    Cancelled,

    #[error("Mining worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl MinerError {
    /// Lifecycle bugs in the caller, as opposed to host or input conditions.
    pub fn is_logic_fault(&self) -> bool {
        matches!(self, MinerError::DoubleRelease | MinerError::HandleInUse(_))
    }
}

pub type Result<T> = std::result::Result<T, MinerError>;
