//! Custom error types for scan operations

use std::fmt;
use thiserror::Error;

/// Main error type for scanner operations.
///
/// Partial bulk reads are deliberately absent: a short read is not a
/// failure but a truncation signal, handled inside the candidate block
/// that observed it.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("process {pid} unavailable: {reason}")]
    ProcessUnavailable { pid: u32, reason: String },

    #[error("failed to read memory at {address}: {reason}")]
    ReadFault { address: String, reason: String },

    #[error("failed to write memory at {address}: {reason}")]
    WriteFault { address: String, reason: String },

    #[error("region query failed at {address}")]
    RegionQueryFailed { address: String },

    #[error("invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("invalid scan condition: {0}")]
    InvalidCondition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scanner operations
pub type ScanResult<T> = Result<T, ScanError>;

impl ScanError {
    /// Creates a process unavailable error
    pub fn process_unavailable(pid: u32, reason: impl Into<String>) -> Self {
        ScanError::ProcessUnavailable {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a read fault for a single address
    pub fn read_fault(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        ScanError::ReadFault {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a write fault for a single address
    pub fn write_fault(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        ScanError::WriteFault {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a per-region query failure (skippable during enumeration)
    pub fn region_query_failed(address: impl fmt::Display) -> Self {
        ScanError::RegionQueryFailed {
            address: address.to_string(),
        }
    }
}
