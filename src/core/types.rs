// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/types.rs
// Version: 1.1.0
//
// This file defines core data structures for the BMX miner, located in the
// core subdirectory. It includes the command-line arguments, the miner
// configuration derived from them, and the mining result.
//
// Tree Location:
// - src/core/types.rs (core data structures)
// - Depends on: clap, serde, serde_json

use crate::core::difficulty::{U256, parse_target, target_from_leading_zero_bits};
use crate::core::digest::Digest256;
use crate::core::scratchpad::{ScratchpadLayout, ScratchpadMode};
use crate::error::{MinerError, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the BMX miner
#[derive(Parser, Debug)]
#[command(
    name = "bmx",
    version,
    about = "Memory-hard BMX proof-of-work CPU miner",
    long_about = "BMX mines a single round: it hashes the whole scratchpad plus a nonce with\n\
                  SHA-256 until the digest falls below the target.\n\n\
                  MODES: light (256 MiB scratchpad) or fast (2080 MiB scratchpad)\n\n\
                  Examples:\n\
                    bmx --mode light --target 0x00000FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF\n\
                    bmx --mode fast --leading-zeros 16 --threads 8 --json"
)]
pub struct Args {
    /// Scratchpad mode: light (256 MiB) or fast (2080 MiB)
    #[arg(
        short,
        long,
        default_value = "light",
        value_name = "MODE",
        help = "Scratchpad mode [light=256 MiB, fast=2080 MiB]"
    )]
    pub mode: String,

    /// Target as 0x-prefixed hex, 64-digit hex or decimal; a digest wins when strictly below it
    #[arg(
        short = 'T',
        long,
        value_name = "TARGET",
        conflicts_with = "leading_zeros",
        help = "Difficulty target (hex or decimal)"
    )]
    pub target: Option<String>,

    /// Alternative to --target: number of leading zero bits the digest needs
    #[arg(
        short = 'z',
        long,
        value_name = "BITS",
        help = "Required leading zero bits (alternative to --target)"
    )]
    pub leading_zeros: Option<u32>,

    /// Number of mining threads; 1 reproduces the single-threaded reference loop
    #[arg(
        short,
        long,
        default_value = "1",
        value_name = "COUNT",
        help = "Number of CPU threads (0 = auto-detect)"
    )]
    pub threads: usize,

    /// Seconds between hashrate reports
    #[arg(
        long,
        default_value = "10",
        value_name = "SECONDS",
        help = "Progress report interval in seconds"
    )]
    pub report_interval: u64,

    /// log4rs YAML configuration; the built-in console logger is used when absent
    #[arg(long, value_name = "PATH", help = "log4rs configuration file")]
    pub log_config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print the result as JSON on stdout
    #[arg(long, default_value = "false", help = "Print the mining result as JSON")]
    pub json: bool,
}

impl Args {
    /// Validate arguments and return helpful errors
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.target.is_none() && self.leading_zeros.is_none() {
            return Err("A target is required. Use --target HEX or --leading-zeros BITS".to_string());
        }

        if let Err(e) = self.mode.parse::<ScratchpadMode>() {
            return Err(e.to_string());
        }

        if self.threads > 1024 {
            return Err("Thread count cannot exceed 1024".to_string());
        }

        if self.report_interval == 0 {
            return Err("Report interval must be greater than 0 seconds".to_string());
        }

        if let Some(bits) = self.leading_zeros {
            if bits > 256 {
                return Err("Leading zero bits cannot exceed 256".to_string());
            }
        }

        Ok(())
    }

    /// Resolve the target from --target or --leading-zeros
    pub fn resolve_target(&self) -> Result<U256> {
        match (&self.target, self.leading_zeros) {
            (Some(text), _) => parse_target(text),
            (None, Some(bits)) => target_from_leading_zero_bits(bits),
            (None, None) => Err(MinerError::InvalidTarget("no target given".to_string())),
        }
    }

    pub fn miner_config(&self) -> Result<MinerConfig> {
        let mode: ScratchpadMode = self.mode.parse()?;
        Ok(MinerConfig::new(mode)
            .with_threads(self.threads)
            .with_report_interval(Duration::from_secs(self.report_interval)))
    }
}

/// Runtime configuration of a miner
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Mode the scratchpad size was derived from
    pub mode: ScratchpadMode,

    /// Scratchpad size actually allocated
    pub layout: ScratchpadLayout,

    /// Worker count, 0 = one per logical CPU
    pub threads: usize,

    /// Interval between progress reports
    pub report_interval: Duration,
}

impl MinerConfig {
    pub fn new(mode: ScratchpadMode) -> Self {
        Self {
            mode,
            layout: mode.into(),
            threads: 1,
            report_interval: Duration::from_secs(10),
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Override the scratchpad size; the mode is kept for reporting.
    pub fn with_layout(mut self, layout: ScratchpadLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Effective number of workers
    pub fn worker_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

/// Outcome of a successful mining session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningResult {
    pub digest: Digest256,
    pub nonce: u64,
    pub elapsed: Duration,
    pub hashes: u64,
    pub worker_id: usize,
}

impl MiningResult {
    /// Average hashrate over the session
    pub fn hashrate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.hashes as f64 / secs
        } else {
            0.0
        }
    }

    pub fn report(&self) -> MiningReport {
        MiningReport {
            digest: self.digest.to_hex(),
            nonce: self.nonce,
            elapsed_secs: self.elapsed.as_secs_f64(),
            hashes: self.hashes,
            hashrate: self.hashrate(),
            worker_id: self.worker_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.report()).unwrap_or(serde_json::Value::Null)
    }
}

/// Serializable summary of a mining result, as printed with --json
#[derive(Debug, Clone, Serialize)]
pub struct MiningReport {
    pub digest: String,
    pub nonce: u64,
    pub elapsed_secs: f64,
    pub hashes: u64,
    pub hashrate: f64,
    pub worker_id: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("bmx").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_args_defaults_and_config() {
        let args = parse(&["--leading-zeros", "8"]);
        assert!(args.validate().is_ok());
        let config = args.miner_config().unwrap();
        assert_eq!(config.mode, ScratchpadMode::Light);
        assert_eq!(config.layout.bytes(), 256 * 1024 * 1024);
        assert_eq!(config.worker_count(), 1);
        assert_eq!(config.report_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_args_validation_errors() {
        assert!(parse(&["--mode", "fast"]).validate().is_err(), "target is required");
        assert!(parse(&["--mode", "huge", "-z", "4"]).validate().is_err());
        assert!(parse(&["-z", "4", "--threads", "2000"]).validate().is_err());
        assert!(parse(&["-z", "300"]).validate().is_err());
        assert!(parse(&["-z", "4", "--report-interval", "0"]).validate().is_err());
    }

    #[test]
    fn test_target_and_leading_zeros_conflict() {
        let result = Args::try_parse_from(["bmx", "--target", "0x10", "--leading-zeros", "4"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_target() {
        let args = parse(&["--target", "0x00ff"]);
        assert_eq!(args.resolve_target().unwrap(), U256::from(255u64));
        let args = parse(&["-z", "255"]);
        assert_eq!(args.resolve_target().unwrap(), U256::from(2u64));
    }

    #[test]
    fn test_invalid_mode_config() {
        let args = parse(&["--mode", "medium", "-z", "1"]);
        assert!(matches!(args.miner_config(), Err(MinerError::InvalidMode(_))));
    }

    #[test]
    fn test_result_json() {
        let result = MiningResult {
            digest: Digest256::from_bytes([0xAB; 32]),
            nonce: 7,
            elapsed: Duration::from_millis(1500),
            hashes: 8,
            worker_id: 0,
        };
        let value = result.to_json();
        assert_eq!(value["digest"], "ab".repeat(32));
        assert_eq!(value["nonce"], 7);
        assert_eq!(value["elapsed_secs"], 1.5);
        assert_eq!(value["worker_id"], 0);
        assert!((result.hashrate() - 8.0 / 1.5).abs() < 1e-9);
    }
}

// Changelog:
// - v1.1.0: Added --leading-zeros as an alternative target form and a
//   serializable report for JSON output of the mining result.
// - v1.0.0: Initial arguments, configuration and result types.
