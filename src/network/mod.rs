// file: src/network/mod.rs
// version: 1.0.0
// guid: d84a2e25-0596-4389-93af-e1d62bcf0a9c

//! Network operations module

pub mod download;

pub use download::{extract_zip, NetworkDownloader};
