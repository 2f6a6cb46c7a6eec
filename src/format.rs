//! Human-readable formatting for byte counts and large counters.
//!
//! All functions are pure and allocate only the returned string, so they can be called from any consumer of a
//! [`MemorySnapshot`](crate::memory::MemorySnapshot) on every redraw.
//!
//! ```rust
//! use darwin_memwatch::format::{format_bytes, format_bytes_short, format_count};
//!
//! assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
//! assert_eq!(format_bytes_short(1_610_612_736), "1.5 GB");
//! assert_eq!(format_count(1_500_000), "1.5M");
//! ```

const BYTES_PER_GB: f64 = 1_073_741_824.0;

fn as_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

/// Formats a byte count in GB with two decimals, e.g. `"12.34 GB"`
pub fn format_bytes(bytes: u64) -> String {
    format!("{:.2} GB", as_gb(bytes))
}

/// Formats a byte count in whole GB, e.g. `"16 GB"`
pub fn format_bytes_whole(bytes: u64) -> String {
    format!("{:.0} GB", as_gb(bytes))
}

/// Formats a byte count in GB with one decimal, e.g. `"1.5 GB"`
pub fn format_bytes_short(bytes: u64) -> String {
    format!("{:.1} GB", as_gb(bytes))
}

/// Abbreviates a counter with a `K` or `M` suffix
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}
