// file: src/cli/mod.rs
// version: 1.0.0
// guid: 1415aedf-af89-4c69-a638-2244d9f1ebbd

//! Command line interface for the remote access agent

pub mod args;
pub mod commands;
pub mod prompt;

pub use args::Cli;
pub use commands::*;
