// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/candidate.rs
// Version: 1.1.0
//
// This file builds the byte sequence hashed for each nonce: the full
// scratchpad, words serialized little-endian, followed by the nonce as 8
// big-endian bytes.
//
// Tree Location:
// - src/core/candidate.rs (candidate construction)
// - Depends on: error

use crate::error::{MinerError, Result};

/// Length of the serialized nonce suffix
pub const NONCE_BYTES: usize = 8;

/// Candidate length for a scratchpad of `words` words, `None` on overflow
pub fn candidate_len(words: usize) -> Option<usize> {
    words.checked_mul(8)?.checked_add(NONCE_BYTES)
}

/// Build the candidate for `nonce` into a fresh buffer.
///
/// Used to re-check a reported solution; the mining loop goes through a
/// `CandidateBuilder` whose buffer is reserved up front.
pub fn build(words: &[u64], nonce: u64) -> Vec<u8> {
    let mut candidate = Vec::new();
    CandidateBuilder::build_into(&mut candidate, words, nonce);
    candidate
}

/// Per-worker candidate buffer, reused across nonces
#[derive(Debug, Default)]
pub struct CandidateBuilder {
    buffer: Vec<u8>,
}

impl CandidateBuilder {
    /// Reserve a buffer large enough for a candidate over `words` words.
    ///
    /// Fails with `Allocation` instead of aborting when the host cannot
    /// provide the memory.
    pub fn new(words: usize) -> Result<Self> {
        let bytes = candidate_len(words).ok_or(MinerError::Allocation {
            bytes: usize::MAX,
            source: None,
        })?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(bytes)
            .map_err(|e| MinerError::Allocation {
                bytes,
                source: Some(e),
            })?;
        Ok(Self { buffer })
    }

    /// Bytes the buffer can hold without growing
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Serialize into the owned buffer and return it.
    pub fn build(&mut self, words: &[u64], nonce: u64) -> &[u8] {
        Self::build_into(&mut self.buffer, words, nonce);
        &self.buffer
    }

    /// Rewrites `out` from scratch. The whole scratchpad is copied on every
    /// call; the per-attempt memory traffic is what the proof-of-work costs.
    /// A buffer from `CandidateBuilder::new` never grows here.
    pub fn build_into(out: &mut Vec<u8>, words: &[u64], nonce: u64) {
        out.clear();
        for word in words {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&nonce.to_be_bytes());
    }
}

/// Nonce carried in the last 8 bytes of a candidate
pub fn nonce_of(candidate: &[u8]) -> Option<u64> {
    let start = candidate.len().checked_sub(NONCE_BYTES)?;
    let bytes: [u8; NONCE_BYTES] = candidate[start..].try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}


// Changelog:
// - v1.1.0: Candidate buffers are reserved fallibly and sized once per worker.
// - v1.0.0: Scratchpad plus big-endian nonce serialization.
