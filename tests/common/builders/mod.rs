pub mod memory;
pub mod power;
pub mod process;
