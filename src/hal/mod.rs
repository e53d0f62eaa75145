pub mod cpu;
pub mod frontend;
pub mod ops;
