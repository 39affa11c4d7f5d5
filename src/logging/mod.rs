// file: src/logging/mod.rs
// version: 1.0.0
// guid: acfb2e61-dd56-4216-ad3b-d152b6b95f80

//! Logging system for the remote access agent

pub mod logger;

pub use logger::init_logger;
