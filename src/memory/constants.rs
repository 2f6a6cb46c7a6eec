/// Usage ratio above which pressure is reported as `Warning`
pub const DEFAULT_WARNING_RATIO: f64 = 0.75;

/// Usage ratio above which pressure is reported as `Critical`
pub const DEFAULT_CRITICAL_RATIO: f64 = 0.90;

/// Number of top memory consumers kept in a snapshot
pub const DEFAULT_TOP_PROCESS_COUNT: usize = 5;

/// Upper bound accepted for the top process count
pub const MAX_TOP_PROCESS_COUNT: usize = 50;
