// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/difficulty.rs
// Version: 1.1.1
//
// This file contains the 256-bit target type and the functions that parse
// caller-supplied targets and estimate the work they imply, located in the
// core subdirectory of the BMX miner source tree.

use crate::error::{MinerError, Result};
use log::{debug, warn};

const LOG_TARGET: &str = "bmx::core::difficulty";

// Kept in its own module so the macro expansion sees std's two-argument Result.
mod uint_impl {
    uint::construct_uint! {
        pub struct U256(4);
    }
}

pub use uint_impl::U256;

/// Maximum number of significant hex digits in a 256-bit target
const MAX_TARGET_HEX_DIGITS: usize = 64;

/// Parse a target given as `0x`-prefixed hex, bare hex of 64 digits, or decimal.
///
/// A bare string is read as decimal unless it contains hex letters or is
/// exactly 64 characters long, which is how digests and targets are printed.
pub fn parse_target(input: &str) -> Result<U256> {
    let text = input.trim();
    if text.is_empty() {
        warn!(target: LOG_TARGET, "Empty target string");
        return Err(MinerError::InvalidTarget("target is empty".to_string()));
    }

    let hex_digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| {
            let looks_hex = text.len() == MAX_TARGET_HEX_DIGITS
                || text.chars().any(|c| c.is_ascii_alphabetic());
            looks_hex.then_some(text)
        });

    let target = match hex_digits {
        Some(digits) => parse_hex_target(digits)?,
        None => U256::from_dec_str(text).map_err(|e| {
            MinerError::InvalidTarget(format!("'{}' is not a 256-bit decimal integer: {:?}", text, e))
        })?,
    };

    if target.is_zero() {
        warn!(target: LOG_TARGET, "Target is zero: no digest can satisfy it");
    }
    debug!(target: LOG_TARGET, "Parsed target: {:064x}", target);
    Ok(target)
}

fn parse_hex_target(digits: &str) -> Result<U256> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MinerError::InvalidTarget(format!("'{}' is not a hex integer", digits)));
    }
    let significant = digits.trim_start_matches('0');
    if significant.len() > MAX_TARGET_HEX_DIGITS {
        return Err(MinerError::InvalidTarget(format!(
            "target has {} significant hex digits, at most {} allowed",
            significant.len(),
            MAX_TARGET_HEX_DIGITS
        )));
    }
    if significant.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(significant, 16)
        .map_err(|e| MinerError::InvalidTarget(format!("'{}': {:?}", digits, e)))
}

/// Target that accepts exactly the digests with at least `bits` leading zero bits.
///
/// For `bits == 0` the target is `U256::MAX`. The comparison is strict, so the
/// all-`0xFF` digest is the one digest this target still rejects.
pub fn target_from_leading_zero_bits(bits: u32) -> Result<U256> {
    if bits > 256 {
        return Err(MinerError::InvalidTarget(format!(
            "{} leading zero bits requested, a digest has 256",
            bits
        )));
    }
    // digest < (1 << (256 - bits)), i.e. digest <= MAX >> bits
    let target = match bits {
        0 => U256::MAX,
        256 => U256::zero(),
        _ => U256::one() << (256 - bits as usize),
    };
    debug!(target: LOG_TARGET, "{} leading zero bits -> target: {:064x}", bits, target);
    Ok(target)
}

/// Average number of attempts needed to hit `target`, `None` when it is unreachable.
pub fn expected_attempts(target: &U256) -> Option<U256> {
    if target.is_zero() {
        return None;
    }
    let attempts = U256::MAX / *target;
    Some(if attempts.is_zero() { U256::one() } else { attempts })
}

/// Number of leading zero bits in a 32-byte digest
pub fn leading_zero_bits(hash: &[u8; 32]) -> u32 {
    U256::from_big_endian(hash).leading_zeros()
}


// Changelog:
// - v1.1.1: U256 lives in a private module; documented the zero-bit target.
// - v1.1.0: Added decimal targets and leading-zero-bit targets.
// - v1.0.0: Initial U256 target parsing carried over from the pool miner's
//   SHA-256 target handling, with strict big-endian hex input.
