//! # Power Source Monitoring Module
//!
//! Tracks whether the machine is running on AC power or battery and delivers a notification whenever the operating
//! system reports a power-source change.
//!
//! The notification itself carries no state. On every notification the observer re-reads the full power-source list
//! and compares the "Power Source State" of the sources against the AC marker. When several sources are present
//! (for example an internal battery and a UPS), the last source in list order decides.
//!
//! ## macOS Implementation Details
//!
//! [`DarwinPowerSources`] uses `IOPSCopyPowerSourcesInfo` for queries and `IOPSNotificationCreateRunLoopSource` for
//! notifications. The run-loop source is serviced by a dedicated thread owned by the returned [`PowerSubscription`];
//! dropping the subscription stops that thread, and no callback fires after the drop returns.

#[cfg(target_os = "macos")]
mod darwin;

use std::fmt;

use tracing::{debug, warn};

use crate::error::Result;

#[cfg(target_os = "macos")]
pub use darwin::DarwinPowerSources;

/// Value of the "Power Source State" key for a source drawing from the wall
pub const AC_POWER_VALUE: &str = "AC Power";

/// Value of the "Power Source State" key for a source running on its battery
pub const BATTERY_POWER_VALUE: &str = "Battery Power";

/// Callback invoked on every OS power-source notification
pub type PowerCallback = Box<dyn Fn() + Send + Sync>;

/// Access to the operating system's power-source information
pub trait PowerSource: Send + Sync {
    /// "Power Source State" of every source, in the order the OS lists them
    fn states(&self) -> Result<Vec<String>>;

    /// Registers `callback` for power-source change notifications
    fn subscribe(&self, callback: PowerCallback) -> Result<PowerSubscription>;
}

/// Handle keeping a power-source subscription alive
///
/// Dropping the handle, or calling [`cancel`](Self::cancel), releases the subscription.
pub struct PowerSubscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl PowerSubscription {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self { teardown: Some(Box::new(teardown)) }
    }

    /// A subscription with nothing to release
    pub fn inert() -> Self {
        Self { teardown: None }
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for PowerSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for PowerSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowerSubscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

/// Decides AC vs battery from the source states; the last reported state wins
///
/// Returns `None` when no source reports a state at all.
pub fn resolve_ac_power<S: AsRef<str>>(states: &[S]) -> Option<bool> {
    states.last().map(|state| state.as_ref() == AC_POWER_VALUE)
}

/// Caches the current power state and detects transitions
#[derive(Debug, Clone)]
pub struct PowerStateObserver {
    on_ac_power: bool,
}

impl Default for PowerStateObserver {
    /// Starts on AC, which is also what a machine without power-source information reports
    fn default() -> Self {
        Self { on_ac_power: true }
    }
}

impl PowerStateObserver {
    pub fn new(on_ac_power: bool) -> Self {
        Self { on_ac_power }
    }

    pub fn on_ac_power(&self) -> bool {
        self.on_ac_power
    }

    /// Re-reads `source` and returns `Ok(true)` only when the AC/battery state flipped
    ///
    /// On failure the cached state is kept.
    pub fn refresh(&mut self, source: &dyn PowerSource) -> Result<bool> {
        let states = source.states()?;
        let Some(on_ac_power) = resolve_ac_power(&states) else {
            debug!("no power source reported a state");
            return Ok(false);
        };

        if on_ac_power == self.on_ac_power {
            return Ok(false);
        }

        self.on_ac_power = on_ac_power;
        Ok(true)
    }

    /// Like [`refresh`](Self::refresh) but logs and swallows failures
    pub fn refresh_or_keep(&mut self, source: &dyn PowerSource) -> bool {
        match self.refresh(source) {
            Ok(changed) => changed,
            Err(e) => {
                warn!(error = %e, on_ac_power = self.on_ac_power, "power query failed, keeping last state");
                false
            },
        }
    }
}

/// [`PowerSource`] with a constant state that never notifies
#[derive(Debug, Clone, Copy)]
pub struct FixedPowerSource {
    on_ac_power: bool,
}

impl FixedPowerSource {
    pub fn ac() -> Self {
        Self { on_ac_power: true }
    }

    pub fn battery() -> Self {
        Self { on_ac_power: false }
    }
}

impl PowerSource for FixedPowerSource {
    fn states(&self) -> Result<Vec<String>> {
        let state = if self.on_ac_power { AC_POWER_VALUE } else { BATTERY_POWER_VALUE };
        Ok(vec![state.to_string()])
    }

    fn subscribe(&self, _callback: PowerCallback) -> Result<PowerSubscription> {
        Ok(PowerSubscription::inert())
    }
}
