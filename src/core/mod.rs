//! Core types shared by every part of the scanner: addresses, element
//! widths, and the error taxonomy.

pub mod types;

pub use types::{Address, ScanError, ScanResult, ScanWidth};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
