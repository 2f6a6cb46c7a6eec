#![allow(non_upper_case_globals)]

use std::ffi::{c_char, c_void, CString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use scopeguard::guard;
use tracing::{debug, info};

use super::{PowerCallback, PowerSource, PowerSubscription};
use crate::error::{Error, Result};

type CFTypeRef = *const c_void;
type CFArrayRef = *const c_void;
type CFDictionaryRef = *const c_void;
type CFStringRef = *const c_void;
type CFRunLoopRef = *mut c_void;
type CFRunLoopSourceRef = *mut c_void;
type CFIndex = isize;
type CFTypeID = usize;
type Boolean = u8;

const kCFStringEncodingUTF8: u32 = 0x0800_0100;

/// Key of the per-source state in a power-source description
const POWER_SOURCE_STATE_KEY: &str = "Power Source State";

/// How long one run-loop slice blocks before the stop flag is re-checked
const RUN_LOOP_SLICE_SECS: f64 = 0.5;

/// Power-source information from IOKit's `IOPowerSources` API
#[derive(Debug, Default, Clone, Copy)]
pub struct DarwinPowerSources;

impl DarwinPowerSources {
    pub fn new() -> Self {
        Self
    }
}

impl PowerSource for DarwinPowerSources {
    fn states(&self) -> Result<Vec<String>> {
        let blob = unsafe { IOPSCopyPowerSourcesInfo() };
        if blob.is_null() {
            return Err(Error::power_query("IOPSCopyPowerSourcesInfo returned null"));
        }
        let blob = guard(blob, |blob| unsafe { CFRelease(blob) });

        let list = unsafe { IOPSCopyPowerSourcesList(*blob) };
        if list.is_null() {
            return Err(Error::power_query("IOPSCopyPowerSourcesList returned null"));
        }
        let list = guard(list, |list| unsafe { CFRelease(list) });

        let key = cf_string(POWER_SOURCE_STATE_KEY)?;

        let count = unsafe { CFArrayGetCount(*list) };
        let mut states = Vec::with_capacity(count.max(0) as usize);
        for index in 0..count {
            let description = unsafe {
                let source = CFArrayGetValueAtIndex(*list, index);
                IOPSGetPowerSourceDescription(*blob, source)
            };
            if description.is_null() {
                continue;
            }

            let value = unsafe { CFDictionaryGetValue(description, *key) };
            if let Some(state) = string_from_cf(value) {
                states.push(state);
            }
        }

        Ok(states)
    }

    fn subscribe(&self, callback: PowerCallback) -> Result<PowerSubscription> {
        let active = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<usize>>();

        let thread_active = Arc::clone(&active);
        let thread = thread::Builder::new()
            .name("power-source-observer".to_string())
            .spawn(move || run_notification_loop(thread_active, callback, ready_tx))?;

        let run_loop = match ready_rx.recv() {
            Ok(Ok(run_loop)) => run_loop,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            },
            Err(_) => {
                let _ = thread.join();
                return Err(Error::power_query("power observer thread exited before start"));
            },
        };

        info!("subscribed to power source notifications");
        Ok(PowerSubscription::new(move || {
            active.store(false, Ordering::Release);
            unsafe { CFRunLoopStop(run_loop as CFRunLoopRef) };
            let _ = thread.join();
            debug!("power source notifications released");
        }))
    }
}

struct CallbackContext {
    active: Arc<AtomicBool>,
    callback: PowerCallback,
}

extern "C" fn power_sources_changed(context: *mut c_void) {
    if context.is_null() {
        return;
    }
    // SAFETY: context is the CallbackContext owned by the run loop thread, freed only after the source is invalidated
    let context = unsafe { &*(context as *const CallbackContext) };
    if context.active.load(Ordering::Acquire) {
        (context.callback)();
    }
}

fn run_notification_loop(active: Arc<AtomicBool>, callback: PowerCallback, ready: mpsc::Sender<Result<usize>>) {
    let context = Box::into_raw(Box::new(CallbackContext { active: Arc::clone(&active), callback }));

    let source = unsafe { IOPSNotificationCreateRunLoopSource(power_sources_changed, context.cast()) };
    if source.is_null() {
        // SAFETY: the context was never handed to a live run loop source
        drop(unsafe { Box::from_raw(context) });
        let _ = ready.send(Err(Error::power_query("IOPSNotificationCreateRunLoopSource returned null")));
        return;
    }

    let run_loop = unsafe {
        let run_loop = CFRunLoopGetCurrent();
        CFRunLoopAddSource(run_loop, source, kCFRunLoopDefaultMode);
        run_loop
    };
    let _ = ready.send(Ok(run_loop as usize));

    while active.load(Ordering::Acquire) {
        unsafe { CFRunLoopRunInMode(kCFRunLoopDefaultMode, RUN_LOOP_SLICE_SECS, 0) };
    }

    unsafe {
        CFRunLoopSourceInvalidate(source);
        CFRelease(source as CFTypeRef);
        drop(Box::from_raw(context));
    }
}

/// Owned CFString released when the guard drops
fn cf_string(value: &str) -> Result<scopeguard::ScopeGuard<CFStringRef, impl FnOnce(CFStringRef)>> {
    let c_value = CString::new(value).map_err(|_| Error::power_query("key contains a nul byte"))?;
    let string = unsafe { CFStringCreateWithCString(std::ptr::null(), c_value.as_ptr(), kCFStringEncodingUTF8) };
    if string.is_null() {
        return Err(Error::power_query(format!("failed to create CFString for {:?}", value)));
    }
    Ok(guard(string, |string| unsafe { CFRelease(string) }))
}

fn string_from_cf(value: CFTypeRef) -> Option<String> {
    if value.is_null() || unsafe { CFGetTypeID(value) != CFStringGetTypeID() } {
        return None;
    }

    let mut buffer = [0 as c_char; 256];
    let ok = unsafe { CFStringGetCString(value, buffer.as_mut_ptr(), buffer.len() as CFIndex, kCFStringEncodingUTF8) };
    if ok == 0 {
        return None;
    }

    // SAFETY: CFStringGetCString nul-terminates on success
    let c_str = unsafe { std::ffi::CStr::from_ptr(buffer.as_ptr()) };
    Some(c_str.to_string_lossy().into_owned())
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    static kCFRunLoopDefaultMode: CFStringRef;

    fn CFRelease(cf: CFTypeRef);
    fn CFGetTypeID(cf: CFTypeRef) -> CFTypeID;
    fn CFStringGetTypeID() -> CFTypeID;
    fn CFStringCreateWithCString(alloc: *const c_void, c_str: *const c_char, encoding: u32) -> CFStringRef;
    fn CFStringGetCString(string: CFStringRef, buffer: *mut c_char, size: CFIndex, encoding: u32) -> Boolean;
    fn CFArrayGetCount(array: CFArrayRef) -> CFIndex;
    fn CFArrayGetValueAtIndex(array: CFArrayRef, index: CFIndex) -> *const c_void;
    fn CFDictionaryGetValue(dict: CFDictionaryRef, key: *const c_void) -> *const c_void;

    fn CFRunLoopGetCurrent() -> CFRunLoopRef;
    fn CFRunLoopAddSource(run_loop: CFRunLoopRef, source: CFRunLoopSourceRef, mode: CFStringRef);
    fn CFRunLoopRunInMode(mode: CFStringRef, seconds: f64, return_after_source_handled: Boolean) -> i32;
    fn CFRunLoopStop(run_loop: CFRunLoopRef);
    fn CFRunLoopSourceInvalidate(source: CFRunLoopSourceRef);
}

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOPSCopyPowerSourcesInfo() -> CFTypeRef;
    fn IOPSCopyPowerSourcesList(blob: CFTypeRef) -> CFArrayRef;
    fn IOPSGetPowerSourceDescription(blob: CFTypeRef, source: CFTypeRef) -> CFDictionaryRef;
    fn IOPSNotificationCreateRunLoopSource(
        callback: extern "C" fn(*mut c_void),
        context: *mut c_void,
    ) -> CFRunLoopSourceRef;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_power_states() {
        let states = DarwinPowerSources::new().states().unwrap();
        for state in states {
            assert!(!state.is_empty());
        }
    }

    #[test]
    fn test_live_subscription_teardown() {
        let subscription = DarwinPowerSources::new().subscribe(Box::new(|| {})).unwrap();
        subscription.cancel();
    }
}
