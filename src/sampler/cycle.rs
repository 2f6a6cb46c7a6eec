use std::sync::Arc;
use std::time::SystemTime;

use tracing::warn;

use crate::config::SamplerConfig;
use crate::error::Result;
use crate::memory::{available_bytes, MemorySnapshot, PressureThresholds, VmStatsSource};
use crate::process::ProcessSource;

/// Builds snapshots from the memory sources, one cycle at a time
///
/// Each cycle starts from the previous snapshot and overwrites only what its sources returned successfully, so a
/// failed query leaves the corresponding fields at their last known values. Available memory and pressure are always
/// recomputed from the resulting `used_bytes`.
pub struct SamplerCore {
    vm: Arc<dyn VmStatsSource>,
    processes: Arc<dyn ProcessSource>,
    thresholds: PressureThresholds,
    top_process_count: usize,
    current: MemorySnapshot,
}

impl SamplerCore {
    /// Reads physical memory once; it stays fixed for the lifetime of the core
    pub fn new(
        vm: Arc<dyn VmStatsSource>,
        processes: Arc<dyn ProcessSource>,
        config: &SamplerConfig,
    ) -> Result<Self> {
        let total = vm.total_memory()?;
        Ok(Self {
            vm,
            processes,
            thresholds: config.thresholds(),
            top_process_count: config.top_process_count,
            current: MemorySnapshot::empty(total, true),
        })
    }

    pub fn current(&self) -> &MemorySnapshot {
        &self.current
    }

    pub async fn sample(&mut self, on_ac_power: bool) -> MemorySnapshot {
        let mut next = self.current.clone();

        match self.vm.vm_counters() {
            Ok(counters) => next.apply_vm_counters(&counters),
            Err(e) => warn!(error = %e, "VM statistics unavailable, keeping previous values"),
        }

        match self.vm.swap_usage() {
            Ok(swap) => next.swap_used_bytes = swap.used,
            Err(e) => warn!(error = %e, "swap usage unavailable, keeping previous value"),
        }

        match self.processes.top_processes(self.top_process_count).await {
            Ok(processes) => next.top_processes = processes,
            Err(e) => warn!(error = %e, "process listing failed, keeping previous list"),
        }

        next.available_bytes = available_bytes(next.total_bytes, next.used_bytes);
        next.pressure_level = self.thresholds.classify_usage(next.used_bytes, next.total_bytes);
        next.on_ac_power = on_ac_power;
        next.sequence = self.current.sequence + 1;
        next.sampled_at = SystemTime::now();

        self.current = next.clone();
        next
    }
}
