// file: src/utils/mod.rs
// version: 1.0.0
// guid: 26d2f733-91e0-4ae6-b0c8-b3410a98d014

//! Utility modules for system operations

pub mod system;

pub use system::SystemUtils;
