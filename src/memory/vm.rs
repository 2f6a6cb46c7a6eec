use crate::error::Result;
use crate::memory::types::{SwapUsage, VmCounters};

#[cfg(test)]
use mockall::automock;

/// Source of raw kernel memory statistics
///
/// Calls are synchronous and expected to complete in well under a millisecond.
#[cfg_attr(test, automock)]
pub trait VmStatsSource: Send + Sync {
    /// Physical memory in bytes; queried once when a sampler starts
    fn total_memory(&self) -> Result<u64>;

    /// Current VM page counters, already multiplied by the page size
    fn vm_counters(&self) -> Result<VmCounters>;

    /// Current swap usage in bytes
    fn swap_usage(&self) -> Result<SwapUsage>;
}
