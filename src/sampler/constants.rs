/// Sampling period on AC power (seconds)
pub const DEFAULT_AC_INTERVAL_SECS: u64 = 5;

/// Sampling period on battery (seconds)
pub const DEFAULT_BATTERY_INTERVAL_SECS: u64 = 15;

/// Bound on a single `top` or `ps` invocation (milliseconds)
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 2_000;

/// Capacity of the sampler's inbound event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// How long `shutdown` waits for the sampling task to finish (milliseconds)
pub const SHUTDOWN_TIMEOUT_MS: u64 = 5_000;
