// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/digest.rs
// Version: 1.0.0
//
// This file implements the digest evaluator: SHA-256 over a candidate and the
// big-endian integer view of the digest used against the target.
//
// Tree Location:
// - src/core/digest.rs (digest evaluation)
// - Depends on: sha2, hex, uint

use crate::core::difficulty::U256;
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fmt;

/// 32-byte hash output
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest256([u8; 32]);

impl Digest256 {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 64-character lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_integer(&self) -> U256 {
        as_integer(self)
    }
}

impl fmt::Display for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest256({})", self.to_hex())
    }
}

/// Hash primitive applied to every candidate.
///
/// Implementations must be pure: the same bytes always yield the same digest.
pub trait PowHasher: Send + Sync {
    fn digest(&self, candidate: &[u8]) -> Result<Digest256>;
}

/// Single SHA-256
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl PowHasher for Sha256Hasher {
    fn digest(&self, candidate: &[u8]) -> Result<Digest256> {
        Ok(Digest256(Sha256::digest(candidate).into()))
    }
}

/// Interpret the digest bytes as a big-endian unsigned integer.
pub fn as_integer(digest: &Digest256) -> U256 {
    U256::from_big_endian(&digest.0)
}

/// A digest wins iff its integer value is strictly below the target.
pub fn meets_target(digest: &Digest256, target: &U256) -> bool {
    as_integer(digest) < *target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let digest = Sha256Hasher.digest(b"abc").unwrap();
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_integer_view_is_big_endian() {
        let mut bytes = [0u8; 32];
        bytes[31] = 0x01;
        assert_eq!(Digest256::from_bytes(bytes).as_integer(), U256::from(1u64));

        let mut bytes = [0u8; 32];
        bytes[0] = 0x80;
        assert_eq!(Digest256::from_bytes(bytes).as_integer(), U256::one() << 255);
    }

    #[test]
    fn test_target_comparison_is_strict() {
        let mut bytes = [0u8; 32];
        bytes[30] = 0x10;
        let digest = Digest256::from_bytes(bytes);
        let value = digest.as_integer();

        assert!(!meets_target(&digest, &value), "Equal to target must not win");
        assert!(meets_target(&digest, &(value + U256::one())));
        assert!(!meets_target(&digest, &U256::zero()));
    }

    #[test]
    fn test_hex_rendering_matches_integer_view() {
        let digest = Sha256Hasher.digest(b"bmx").unwrap();
        assert_eq!(format!("{:064x}", digest.as_integer()), digest.to_hex());
        assert_eq!(digest.to_string().len(), 64);
    }
}
