//! memscan: incremental live process-memory scanner and editor.
//!
//! The scanning core is platform independent behind the
//! [`access::ProcessMemoryAccess`] trait; the Windows backend lives in
//! [`access::windows`] and is only compiled on that platform.

pub mod access;
pub mod config;
pub mod core;
pub mod scan;
pub mod ui;

pub use crate::core::types::{Address, ScanError, ScanResult, ScanWidth};
pub use crate::scan::{CandidateBlock, ScanCondition, ScanMatch, ScanSession};
