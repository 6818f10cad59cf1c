//! Process address-space access capability.
//!
//! The scan engine never touches a process directly; everything goes
//! through [`ProcessMemoryAccess`]. The Windows backend wraps the real
//! process APIs, the mock backend serves the test suite.

pub mod mock;
#[cfg(windows)]
pub mod windows;

use crate::core::types::{Address, ScanResult};

/// One region of the target address space, as reported by the query
/// primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionQuery {
    /// Base address of the region
    pub base: Address,
    /// Size of the region in bytes
    pub size: usize,
    /// Whether the region is committed (backed by actual storage)
    pub committed: bool,
    /// Whether the region's protection grants write access
    pub writable: bool,
}

impl RegionQuery {
    /// Address of the first byte past the region
    pub fn end(&self) -> Option<usize> {
        self.base.as_usize().checked_add(self.size)
    }
}

/// Capability to query, read and write one target process's address space.
///
/// Every call blocks until the underlying primitive returns. The handle a
/// backend wraps can be invalidated externally at any time (the process
/// exits); backends surface that as an error, never a crash.
pub trait ProcessMemoryAccess {
    /// Reports the region containing or following `probe`.
    ///
    /// Returns `Ok(None)` once the probe is past the end of the address
    /// space. A dead handle is `ProcessUnavailable`; a single failed probe
    /// is `RegionQueryFailed` and may be skipped by the caller.
    fn query_region(&self, probe: Address) -> ScanResult<Option<RegionQuery>>;

    /// Reads up to `buf.len()` bytes at `address` into `buf`.
    ///
    /// Returns the number of bytes actually read, which may be short when
    /// the tail of the range is no longer accessible.
    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> ScanResult<usize>;

    /// Writes all of `data` at `address`. Partial writes are a `WriteFault`.
    fn write_bytes(&self, address: Address, data: &[u8]) -> ScanResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_query_end() {
        let query = RegionQuery {
            base: Address::new(0x1000),
            size: 0x2000,
            committed: true,
            writable: true,
        };
        assert_eq!(query.end(), Some(0x3000));

        let overflowing = RegionQuery {
            base: Address::new(usize::MAX),
            size: 2,
            committed: true,
            writable: true,
        };
        assert_eq!(overflowing.end(), None);
    }
}
