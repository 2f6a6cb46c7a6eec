//! darwin-memwatch - Live memory telemetry for macOS
//!
//! This crate samples system memory on a power-aware cadence and publishes each sample as one consistent
//! [`MemorySnapshot`](memory::MemorySnapshot): used, wired, active, inactive, compressed and free memory, swap usage,
//! cumulative paging activity, a pressure level and the processes holding the most resident memory.
//!
//! # Features
//!
//! - **Memory accounting**: "used" matches Activity Monitor (app memory + wired + compressed)
//! - **Pressure levels**: Normal, Warning and Critical from configurable usage ratios
//! - **Top processes**: ranked by `top`, named by `ps`, in a single invocation of each
//! - **Power awareness**: every 5 seconds on AC, every 15 seconds on battery, rescheduled on transitions
//!
//! # Examples
//!
//! ```no_run
//! use darwin_memwatch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let sampler = MemorySampler::system(SamplerConfig::default()).await?;
//!
//!     let snapshot = sampler.current_snapshot();
//!     println!("{} of {} used ({})",
//!         format_bytes(snapshot.used_bytes),
//!         format_bytes_whole(snapshot.total_bytes),
//!         snapshot.pressure_level);
//!
//!     sampler.shutdown().await
//! }
//! ```
//!
//! # Safety
//!
//! Kernel statistics and power-source information come from unsafe FFI calls into libSystem, CoreFoundation and
//! IOKit. Every call checks its return status or null pointer, and every CoreFoundation object is released by a
//! scope guard.
//!
//! # Platform support
//!
//! The platform sources only exist on macOS. The data model, parsers, formatters and the sampler itself build
//! everywhere and can be driven by any [`VmStatsSource`](memory::VmStatsSource),
//! [`ProcessSource`](process::ProcessSource) and [`PowerSource`](power::PowerSource).

#![doc(html_root_url = "https://docs.rs/darwin-memwatch/0.1.0")]

pub mod config;
pub mod error;
pub mod format;
pub mod memory;
pub mod power;
pub mod process;
pub mod sampler;

pub use error::{Error, Result};

/// Re-export common types for convenience
pub mod prelude {
    pub use crate::config::SamplerConfig;
    pub use crate::format::{format_bytes, format_bytes_short, format_bytes_whole, format_count};
    pub use crate::memory::{MemorySnapshot, PressureLevel};
    pub use crate::process::ProcessMemory;
    pub use crate::sampler::{MemorySampler, SamplerState};
    pub use crate::Error;
    pub use crate::Result;
}
