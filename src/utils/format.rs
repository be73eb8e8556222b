// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/utils/format.rs
// Version: 1.1.0
//
// This file provides utility functions for formatting statistics in the BMX
// miner, located in the utils subdirectory. It formats hashrate, elapsed time
// and memory sizes for consistent output in logs.
//
// Tree Location:
// - src/utils/format.rs (formatting utilities)
// - Depends on: std

use std::time::Duration;

/// Utility functions for formatting miner statistics
pub struct FormatUtils;

impl FormatUtils {
    /// Format hashrate in appropriate units (H/s, KH/s, MH/s, GH/s)
    pub fn format_hashrate(hashrate: f64) -> String {
        if hashrate >= 1_000_000_000.0 {
            format!("{:.2} GH/s", hashrate / 1_000_000_000.0)
        } else if hashrate >= 1_000_000.0 {
            format!("{:.2} MH/s", hashrate / 1_000_000.0)
        } else if hashrate >= 1_000.0 {
            format!("{:.2} KH/s", hashrate / 1_000.0)
        } else {
            format!("{:.2} H/s", hashrate)
        }
    }

    /// Format an elapsed duration (seconds with decimals, then minutes, then hours)
    pub fn format_elapsed(duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{:.2}s", duration.as_secs_f64())
        } else if secs < 3600 {
            format!("{}m {:02}s", secs / 60, secs % 60)
        } else {
            format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
        }
    }

    /// Format byte counts in binary units (B, KiB, MiB, GiB)
    pub fn format_bytes(bytes: usize) -> String {
        const KIB: usize = 1024;
        const MIB: usize = KIB * 1024;
        const GIB: usize = MIB * 1024;

        if bytes >= GIB && bytes % MIB != 0 {
            format!("{:.2} GiB", bytes as f64 / GIB as f64)
        } else if bytes >= MIB {
            format!("{} MiB", bytes / MIB)
        } else if bytes >= KIB {
            format!("{:.1} KiB", bytes as f64 / KIB as f64)
        } else {
            format!("{} B", bytes)
        }
    }

    /// Format large numbers with suffixes (K, M, B)
    pub fn format_number(num: u64) -> String {
        if num >= 1_000_000_000 {
            format!("{:.1}B", num as f64 / 1_000_000_000.0)
        } else if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hashrate() {
        assert_eq!(FormatUtils::format_hashrate(3.5), "3.50 H/s");
        assert_eq!(FormatUtils::format_hashrate(2_500.0), "2.50 KH/s");
        assert_eq!(FormatUtils::format_hashrate(1_250_000.0), "1.25 MH/s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(FormatUtils::format_bytes(64), "64 B");
        assert_eq!(FormatUtils::format_bytes(256 * 1024 * 1024), "256 MiB");
        assert_eq!(FormatUtils::format_bytes(2080 * 1024 * 1024), "2080 MiB");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(FormatUtils::format_elapsed(Duration::from_millis(1500)), "1.50s");
        assert_eq!(FormatUtils::format_elapsed(Duration::from_secs(125)), "2m 05s");
        assert_eq!(FormatUtils::format_elapsed(Duration::from_secs(3720)), "1h 02m");
    }
}

// Changelog:
// - v1.1.0: Replaced "time ago" durations with elapsed time and added byte
//   sizes for scratchpad reporting.
// - v1.0.0: Hashrate and number formatting.
