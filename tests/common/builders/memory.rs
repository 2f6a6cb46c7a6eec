use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use darwin_memwatch::memory::{SwapUsage, VmCounters, VmStatsSource};
use darwin_memwatch::{Error, Result};

/// Builder for creating test VM statistics sources
pub struct TestVmBuilder {
    total: Option<u64>,
    counters: VmCounters,
    swap: SwapUsage,
}

impl TestVmBuilder {
    /// A 16 GiB machine with nothing in use
    pub fn new() -> Self {
        Self { total: Some(16 << 30), counters: VmCounters::default(), swap: SwapUsage::default() }
    }

    pub fn total(mut self, bytes: u64) -> Self {
        self.total = Some(bytes);
        self
    }

    /// Makes the physical memory query fail
    pub fn without_total(mut self) -> Self {
        self.total = None;
        self
    }

    /// Sets app memory, wired and compressed bytes, in that order
    pub fn used(mut self, app: u64, wired: u64, compressed: u64) -> Self {
        self.counters.internal = app;
        self.counters.purgeable = 0;
        self.counters.wired = wired;
        self.counters.compressed = compressed;
        self
    }

    pub fn counters(mut self, counters: VmCounters) -> Self {
        self.counters = counters;
        self
    }

    pub fn swap_used(mut self, bytes: u64) -> Self {
        self.swap = SwapUsage { total: bytes * 2, used: bytes, free: bytes };
        self
    }

    pub fn build(self) -> StaticVm {
        StaticVm {
            total: self.total,
            counters: Arc::new(Mutex::new(self.counters)),
            swap: self.swap,
            failing: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for TestVmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// VM source reporting values the test can change between samples
#[derive(Clone)]
pub struct StaticVm {
    total: Option<u64>,
    counters: Arc<Mutex<VmCounters>>,
    swap: SwapUsage,
    failing: Arc<AtomicBool>,
}

impl StaticVm {
    pub fn set_counters(&self, counters: VmCounters) {
        *self.counters.lock() = counters;
    }

    /// While set, VM counter and swap queries fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl VmStatsSource for StaticVm {
    fn total_memory(&self) -> Result<u64> {
        self.total.ok_or_else(|| Error::SourceUnavailable("sysctl hw.memsize failed".to_string()))
    }

    fn vm_counters(&self) -> Result<VmCounters> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable("host_statistics64 returned 5".to_string()));
        }
        Ok(*self.counters.lock())
    }

    fn swap_usage(&self) -> Result<SwapUsage> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable("sysctl vm.swapusage failed".to_string()));
        }
        Ok(self.swap)
    }
}
