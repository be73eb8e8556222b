// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/scratchpad.rs
// Version: 1.0.2
//
// This file implements the scratchpad memory manager, located in the core
// subdirectory. It sizes, reserves and releases the large word region that
// every hash attempt of a mining session reads in full.
//
// Tree Location:
// - src/core/scratchpad.rs (scratchpad lifecycle)
// - Depends on: log, thiserror (via crate::error)

use crate::error::{MinerError, Result};
use crate::utils::format::FormatUtils;
use log::{debug, info, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const LOG_TARGET: &str = "bmx::core::scratchpad";

const MIB: usize = 1024 * 1024;
const WORD_BYTES: usize = std::mem::size_of::<u64>();

/// Light mode scratchpad size (256 MiB)
pub const LIGHT_SCRATCHPAD_BYTES: usize = 256 * MIB;

/// Fast mode scratchpad size (2080 MiB)
pub const FAST_SCRATCHPAD_BYTES: usize = 2080 * MIB;

/// Memory footprint selector for a mining session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScratchpadMode {
    Light,
    Fast,
}

impl ScratchpadMode {
    pub const fn size_bytes(self) -> usize {
        match self {
            ScratchpadMode::Light => LIGHT_SCRATCHPAD_BYTES,
            ScratchpadMode::Fast => FAST_SCRATCHPAD_BYTES,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ScratchpadMode::Light => "light",
            ScratchpadMode::Fast => "fast",
        }
    }
}

impl FromStr for ScratchpadMode {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ScratchpadMode::Light),
            "fast" => Ok(ScratchpadMode::Fast),
            _ => Err(MinerError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for ScratchpadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size of a scratchpad region in bytes, always a non-zero multiple of 8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchpadLayout {
    bytes: usize,
}

impl ScratchpadLayout {
    /// Explicit size, used by tooling and tests that cannot afford a full mode.
    pub fn custom(bytes: usize) -> Result<Self> {
        if bytes == 0 || bytes % WORD_BYTES != 0 {
            return Err(MinerError::InvalidLayout { bytes });
        }
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn words(&self) -> usize {
        self.bytes / WORD_BYTES
    }
}

impl From<ScratchpadMode> for ScratchpadLayout {
    fn from(mode: ScratchpadMode) -> Self {
        Self {
            bytes: mode.size_bytes(),
        }
    }
}

/// Source of scratchpad memory.
///
/// `reserve` must either hand back a zeroed region of exactly `words` words or
/// fail without keeping anything allocated. Every region handed out is passed
/// back to `reclaim` exactly once.
pub trait RegionAllocator: Send + Sync {
    fn reserve(&self, words: usize) -> Result<Vec<u64>>;

    fn reclaim(&self, region: Vec<u64>);
}

/// Plain heap allocator with fallible reservation
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl RegionAllocator for HeapAllocator {
    fn reserve(&self, words: usize) -> Result<Vec<u64>> {
        let bytes = words.saturating_mul(WORD_BYTES);
        let mut region = Vec::new();
        region
            .try_reserve_exact(words)
            .map_err(|e| MinerError::Allocation {
                bytes,
                source: Some(e),
            })?;
        region.resize(words, 0);
        Ok(region)
    }

    fn reclaim(&self, region: Vec<u64>) {
        drop(region);
    }
}

/// Large read-only word region owned by one mining session
pub struct Scratchpad {
    layout: ScratchpadLayout,
    region: Option<Vec<u64>>,
    allocator: Arc<dyn RegionAllocator>,
}

impl Scratchpad {
    /// Allocate a zeroed scratchpad for `mode` on the heap.
    pub fn allocate(mode: ScratchpadMode) -> Result<Self> {
        Self::allocate_with(mode.into(), Arc::new(HeapAllocator))
    }

    pub fn allocate_with(
        layout: ScratchpadLayout,
        allocator: Arc<dyn RegionAllocator>,
    ) -> Result<Self> {
        let bytes = layout.bytes();
        if bytes > isize::MAX as usize {
            warn!(target: LOG_TARGET, "Refusing {} byte scratchpad: exceeds address space", bytes);
            return Err(MinerError::UnsupportedPlatform { bytes });
        }

        debug!(target: LOG_TARGET, "Reserving {} words", layout.words());
        let region = allocator.reserve(layout.words())?;
        if region.len() != layout.words() {
            let got = region.len();
            allocator.reclaim(region);
            warn!(target: LOG_TARGET, "Allocator returned {} words, expected {}", got, layout.words());
            return Err(MinerError::Allocation {
                bytes,
                source: None,
            });
        }

        info!(target: LOG_TARGET, "🧠 Scratchpad allocated: {}", FormatUtils::format_bytes(bytes));
        Ok(Self {
            layout,
            region: Some(region),
            allocator,
        })
    }

    pub fn layout(&self) -> ScratchpadLayout {
        self.layout
    }

    pub fn byte_len(&self) -> usize {
        self.layout.bytes()
    }

    pub fn is_released(&self) -> bool {
        self.region.is_none()
    }

    /// Read-only view of the region. Fails once the region has been released.
    pub fn words(&self) -> Result<&[u64]> {
        self.region.as_deref().ok_or(MinerError::DoubleRelease)
    }

    /// Hand the region back to its allocator. A second call is a lifecycle
    /// error and reports `DoubleRelease`.
    pub fn release(&mut self) -> Result<()> {
        match self.region.take() {
            Some(region) => {
                self.allocator.reclaim(region);
                info!(target: LOG_TARGET, "🧹 Scratchpad released: {}", FormatUtils::format_bytes(self.layout.bytes()));
                Ok(())
            }
            None => {
                warn!(target: LOG_TARGET, "Release requested on a scratchpad that is not held");
                Err(MinerError::DoubleRelease)
            }
        }
    }
}

impl Drop for Scratchpad {
    fn drop(&mut self) {
        if let Some(region) = self.region.take() {
            debug!(target: LOG_TARGET, "Releasing scratchpad on drop");
            self.allocator.reclaim(region);
        }
    }
}

impl fmt::Debug for Scratchpad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scratchpad")
            .field("bytes", &self.layout.bytes())
            .field("released", &self.is_released())
            .finish()
    }
}


// Changelog:
// - v1.0.2: Reject regions the host cannot address with UnsupportedPlatform
//   instead of attempting the reservation.
// - v1.0.1: Added RegionAllocator so allocation can be tracked per session.
// - v1.0.0: Initial scratchpad manager with light and fast modes.
