#![allow(dead_code)]

pub mod builders;

pub use builders::memory::TestVmBuilder;
pub use builders::power::TestPowerBuilder;
pub use builders::process::TestProcessBuilder;

pub const GIB: u64 = 1 << 30;
