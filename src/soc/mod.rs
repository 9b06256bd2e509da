pub mod device;
pub mod fields;
pub mod regs;
