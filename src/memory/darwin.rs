//! Mach and sysctl backed [`VmStatsSource`].

use std::ffi::c_void;
use std::mem;
use std::ptr;

use crate::error::{Error, Result};
use crate::memory::types::{SwapUsage, VmCounters};
use crate::memory::vm::VmStatsSource;

const KERN_SUCCESS: i32 = 0;
const HOST_VM_INFO64: i32 = 4;

type HostInfoT = *mut i32;
type MachPortT = u32;

/// Reads memory statistics from the running macOS kernel
#[derive(Debug)]
pub struct DarwinVmStats {
    host: MachPortT,
    page_size: u64,
}

impl DarwinVmStats {
    pub fn new() -> Self {
        // SAFETY: both symbols are provided by libSystem and valid for the life of the process
        let (host, page_size) = unsafe { (mach_host_self(), vm_kernel_page_size as u64) };
        Self { host, page_size }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    fn host_vm_info(&self) -> Result<vm_statistics64> {
        let mut info = vm_statistics64::default();
        let mut count = (mem::size_of::<vm_statistics64>() / mem::size_of::<i32>()) as u32;

        let kern_result = unsafe {
            host_statistics64(
                self.host,
                HOST_VM_INFO64,
                (&mut info as *mut vm_statistics64) as HostInfoT,
                &mut count,
            )
        };

        if kern_result != KERN_SUCCESS {
            return Err(Error::source_unavailable(format!(
                "host_statistics64 failed: {}",
                kern_result
            )));
        }

        Ok(info)
    }
}

impl Default for DarwinVmStats {
    fn default() -> Self {
        Self::new()
    }
}

impl VmStatsSource for DarwinVmStats {
    fn total_memory(&self) -> Result<u64> {
        let mut size = 0u64;
        read_sysctl(&mut [libc::CTL_HW, libc::HW_MEMSIZE], &mut size)
            .map_err(|code| Error::source_unavailable(format!("hw.memsize sysctl failed: {}", code)))?;
        Ok(size)
    }

    fn vm_counters(&self) -> Result<VmCounters> {
        let info = self.host_vm_info()?;
        let bytes = |pages: u32| pages as u64 * self.page_size;

        Ok(VmCounters {
            wired: bytes(info.wire_count),
            active: bytes(info.active_count),
            inactive: bytes(info.inactive_count),
            compressed: bytes(info.compressor_page_count),
            free: bytes(info.free_count),
            internal: bytes(info.internal_page_count),
            purgeable: bytes(info.purgeable_count),
            page_ins: info.pageins,
            page_outs: info.pageouts,
        })
    }

    fn swap_usage(&self) -> Result<SwapUsage> {
        // SAFETY: xsw_usage is plain old data
        let mut usage: libc::xsw_usage = unsafe { mem::zeroed() };
        read_sysctl(&mut [libc::CTL_VM, libc::VM_SWAPUSAGE], &mut usage)
            .map_err(|code| Error::source_unavailable(format!("vm.swapusage sysctl failed: {}", code)))?;

        Ok(SwapUsage { total: usage.xsu_total, used: usage.xsu_used, free: usage.xsu_avail })
    }
}

/// Reads a fixed-size sysctl value into `out`, returning the raw status on failure
fn read_sysctl<T>(mib: &mut [libc::c_int], out: &mut T) -> std::result::Result<(), i32> {
    let mut len = mem::size_of::<T>();
    let result = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            mib.len() as libc::c_uint,
            out as *mut T as *mut c_void,
            &mut len,
            ptr::null_mut(),
            0,
        )
    };

    if result == 0 {
        Ok(())
    } else {
        Err(result)
    }
}

#[allow(non_camel_case_types)]
#[repr(C)]
#[derive(Debug, Default)]
struct vm_statistics64 {
    free_count: u32,
    active_count: u32,
    inactive_count: u32,
    wire_count: u32,
    zero_fill_count: u64,
    reactivations: u64,
    pageins: u64,
    pageouts: u64,
    faults: u64,
    cow_faults: u64,
    lookups: u64,
    hits: u64,
    purges: u64,
    purgeable_count: u32,
    speculative_count: u32,
    decompressions: u64,
    compressions: u64,
    swapins: u64,
    swapouts: u64,
    compressor_page_count: u32,
    throttled_count: u32,
    external_page_count: u32,
    internal_page_count: u32,
    total_uncompressed_pages_in_compressor: u64,
}

extern "C" {
    static vm_kernel_page_size: libc::uintptr_t;

    fn host_statistics64(
        host_priv: MachPortT,
        flavor: i32,
        host_info_out: HostInfoT,
        host_info_out_cnt: *mut u32,
    ) -> i32;

    fn mach_host_self() -> MachPortT;
}
