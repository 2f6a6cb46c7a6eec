//! Memory statistics and accounting
//!
//! This module reads the raw counters the kernel keeps about physical memory and turns them into the values a user
//! expects to see. The "used" figure follows the same accounting as Activity Monitor:
//!
//! ```text
//! app memory = internal - purgeable   (never below zero)
//! used       = app memory + wired + compressed
//! available  = total - used           (never below zero)
//! ```
//!
//! Counting free pages instead would treat purgeable and file-backed caches as used memory and disagree with the
//! system's own tools.
//!
//! # Examples
//!
//! ```rust
//! use darwin_memwatch::memory::{PressureLevel, PressureThresholds, VmCounters};
//!
//! let counters = VmCounters {
//!     internal: 6 << 30,
//!     purgeable: 1 << 30,
//!     wired: 2 << 30,
//!     compressed: 1 << 30,
//!     ..VmCounters::default()
//! };
//! assert_eq!(counters.used(), 8 << 30);
//!
//! let level = PressureThresholds::default().classify_usage(counters.used(), 16 << 30);
//! assert_eq!(level, PressureLevel::Normal);
//! ```

/// Memory accounting constants
pub mod constants;

/// Memory data types
pub mod types;

/// Source trait for kernel statistics
pub mod vm;

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(target_os = "macos")]
pub use darwin::DarwinVmStats;
pub use types::*;
pub use vm::VmStatsSource;

#[cfg(test)]
pub(crate) use vm::MockVmStatsSource;
