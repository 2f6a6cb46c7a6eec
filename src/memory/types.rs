use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::memory::constants::{DEFAULT_CRITICAL_RATIO, DEFAULT_WARNING_RATIO};
use crate::process::ProcessMemory;

/// Memory pressure level indicator
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PressureLevel {
    /// Normal memory pressure - sufficient memory available
    #[default]
    Normal,
    /// Warning level memory pressure - memory is becoming constrained
    Warning,
    /// Critical memory pressure - system is under severe memory constraints
    Critical,
}

impl PressureLevel {
    /// Classifies a `used / total` ratio with the default thresholds
    pub fn from_usage_ratio(ratio: f64) -> Self {
        PressureThresholds::default().classify(ratio)
    }
}

impl fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Warning => write!(f, "Warning"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// Ratio thresholds used to classify memory pressure
///
/// Both comparisons are strict: a ratio exactly equal to `warning` is still `Normal`, and one exactly equal to
/// `critical` is still `Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureThresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Default for PressureThresholds {
    fn default() -> Self {
        Self { warning: DEFAULT_WARNING_RATIO, critical: DEFAULT_CRITICAL_RATIO }
    }
}

impl PressureThresholds {
    pub fn classify(&self, ratio: f64) -> PressureLevel {
        if ratio > self.critical {
            PressureLevel::Critical
        } else if ratio > self.warning {
            PressureLevel::Warning
        } else {
            PressureLevel::Normal
        }
    }

    /// Classifies `used` bytes against a fixed physical `total`
    pub fn classify_usage(&self, used: u64, total: u64) -> PressureLevel {
        if total == 0 {
            return PressureLevel::Normal;
        }
        self.classify(used as f64 / total as f64)
    }
}

/// Kernel VM counters converted to bytes
///
/// `page_ins` and `page_outs` stay raw cumulative page counts since boot.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct VmCounters {
    pub wired: u64,
    pub active: u64,
    pub inactive: u64,
    pub compressed: u64,
    pub free: u64,
    pub internal: u64,
    pub purgeable: u64,
    pub page_ins: u64,
    pub page_outs: u64,
}

impl VmCounters {
    /// Anonymous memory owned by applications, excluding purgeable caches
    pub fn app_memory(&self) -> u64 {
        self.internal.saturating_sub(self.purgeable)
    }

    /// Memory counted as used: app memory plus wired plus compressed
    pub fn used(&self) -> u64 {
        self.app_memory()
            .saturating_add(self.wired)
            .saturating_add(self.compressed)
    }
}

/// Swap file usage in bytes
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct SwapUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// Memory left for new allocations; clamps to zero when `used` overshoots `total`
pub fn available_bytes(total: u64, used: u64) -> u64 {
    total.saturating_sub(used)
}

/// One consistent view of system memory, produced once per sampling cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub used_bytes: u64,
    pub wired_bytes: u64,
    pub active_bytes: u64,
    pub inactive_bytes: u64,
    pub compressed_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    /// Physical memory, fixed for the lifetime of the sampler
    pub total_bytes: u64,
    pub swap_used_bytes: u64,
    /// Cumulative page-ins since boot
    pub page_ins: u64,
    /// Cumulative page-outs since boot
    pub page_outs: u64,
    pub pressure_level: PressureLevel,
    /// Highest resident memory first
    pub top_processes: Vec<ProcessMemory>,
    pub on_ac_power: bool,
    /// Number of completed sampling cycles
    pub sequence: u64,
    pub sampled_at: SystemTime,
}

impl MemorySnapshot {
    /// An empty snapshot carrying only the fixed physical total
    pub fn empty(total_bytes: u64, on_ac_power: bool) -> Self {
        Self {
            used_bytes: 0,
            wired_bytes: 0,
            active_bytes: 0,
            inactive_bytes: 0,
            compressed_bytes: 0,
            free_bytes: 0,
            available_bytes: total_bytes,
            total_bytes,
            swap_used_bytes: 0,
            page_ins: 0,
            page_outs: 0,
            pressure_level: PressureLevel::Normal,
            top_processes: Vec::new(),
            on_ac_power,
            sequence: 0,
            sampled_at: SystemTime::now(),
        }
    }

    /// `used / total`, or 0.0 when the total is unknown
    pub fn usage_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.total_bytes as f64
        }
    }

    pub fn usage_percentage(&self) -> f64 {
        (self.usage_ratio() * 100.0).clamp(0.0, 100.0)
    }

    pub(crate) fn apply_vm_counters(&mut self, counters: &VmCounters) {
        self.used_bytes = counters.used();
        self.wired_bytes = counters.wired;
        self.active_bytes = counters.active;
        self.inactive_bytes = counters.inactive;
        self.compressed_bytes = counters.compressed;
        self.free_bytes = counters.free;
        self.page_ins = counters.page_ins;
        self.page_outs = counters.page_outs;
    }
}
