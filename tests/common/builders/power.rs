use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use darwin_memwatch::power::{PowerCallback, PowerSource, PowerSubscription, AC_POWER_VALUE, BATTERY_POWER_VALUE};
use darwin_memwatch::Result;

/// Builder for creating test power sources
pub struct TestPowerBuilder {
    states: Vec<String>,
}

impl TestPowerBuilder {
    pub fn new() -> Self {
        Self { states: vec![AC_POWER_VALUE.to_string()] }
    }

    pub fn on_battery(mut self) -> Self {
        self.states = vec![BATTERY_POWER_VALUE.to_string()];
        self
    }

    /// Replaces the reported source states; an empty list means no power sources
    pub fn states(mut self, states: &[&str]) -> Self {
        self.states = states.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build(self) -> TestPower {
        TestPower {
            inner: Arc::new(PowerInner {
                states: Mutex::new(self.states),
                callback: Mutex::new(None),
                subscriptions: AtomicUsize::new(0),
                released: AtomicBool::new(false),
            }),
        }
    }
}

impl Default for TestPowerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct PowerInner {
    states: Mutex<Vec<String>>,
    callback: Mutex<Option<PowerCallback>>,
    subscriptions: AtomicUsize,
    released: AtomicBool,
}

/// Power source whose state changes and notifications are driven by the test
#[derive(Clone)]
pub struct TestPower {
    inner: Arc<PowerInner>,
}

impl TestPower {
    pub fn set_on_ac(&self, on_ac_power: bool) {
        let state = if on_ac_power { AC_POWER_VALUE } else { BATTERY_POWER_VALUE };
        *self.inner.states.lock() = vec![state.to_string()];
    }

    /// Delivers a change notification the way the OS would; a no-op once released
    pub fn notify(&self) {
        if let Some(callback) = self.inner.callback.lock().as_ref() {
            callback();
        }
    }

    pub fn subscriptions(&self) -> usize {
        self.inner.subscriptions.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }
}

impl PowerSource for TestPower {
    fn states(&self) -> Result<Vec<String>> {
        Ok(self.inner.states.lock().clone())
    }

    fn subscribe(&self, callback: PowerCallback) -> Result<PowerSubscription> {
        *self.inner.callback.lock() = Some(callback);
        self.inner.subscriptions.fetch_add(1, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        Ok(PowerSubscription::new(move || {
            inner.callback.lock().take();
            inner.released.store(true, Ordering::SeqCst);
        }))
    }
}
