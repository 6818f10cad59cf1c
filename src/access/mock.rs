//! In-memory fake process backend.
//!
//! Holds regions behind an `Arc<Mutex<..>>` so a test can keep a clone of
//! the handle and mutate "live" memory between narrowing passes, shrink a
//! region, force partial reads, or kill the process outright.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::access::{ProcessMemoryAccess, RegionQuery};
use crate::core::types::{Address, ScanError, ScanResult};

#[derive(Debug)]
struct Region {
    base: usize,
    bytes: Vec<u8>,
    committed: bool,
    writable: bool,
    query_fails: bool,
}

impl Region {
    fn end(&self) -> usize {
        self.base + self.bytes.len()
    }

    fn contains(&self, address: usize) -> bool {
        self.base <= address && address < self.end()
    }
}

#[derive(Debug, Default)]
struct Inner {
    regions: Vec<Region>,
    exited: bool,
    read_cap: Option<usize>,
}

/// A fake target process whose memory lives on the heap of the test.
///
/// Clones share the same underlying memory.
#[derive(Debug, Clone, Default)]
pub struct MockProcess {
    inner: Arc<Mutex<Inner>>,
}

impl MockProcess {
    pub fn new() -> Self {
        MockProcess::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock process lock poisoned")
    }

    /// Adds a committed, writable region at `base`
    pub fn add_region(&self, base: usize, bytes: Vec<u8>) {
        self.add_region_with(base, bytes, true, true);
    }

    /// Adds a region with explicit state and protection
    pub fn add_region_with(&self, base: usize, bytes: Vec<u8>, committed: bool, writable: bool) {
        let mut inner = self.lock();
        inner.regions.push(Region {
            base,
            bytes,
            committed,
            writable,
            query_fails: false,
        });
        inner.regions.sort_by_key(|r| r.base);
    }

    /// Makes every query landing in the region at `base` fail
    pub fn fail_queries_at(&self, base: usize) {
        let mut inner = self.lock();
        if let Some(region) = inner.regions.iter_mut().find(|r| r.base == base) {
            region.query_fails = true;
        }
    }

    /// Mutates memory from the test side, bypassing the access trait.
    ///
    /// Panics on unmapped ranges; the test owns the layout.
    pub fn set_bytes(&self, address: usize, bytes: &[u8]) {
        let mut inner = self.lock();
        let region = inner
            .regions
            .iter_mut()
            .find(|r| r.contains(address) && address + bytes.len() <= r.end())
            .expect("set_bytes outside any mock region");
        let start = address - region.base;
        region.bytes[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Reads memory from the test side, bypassing the access trait
    pub fn get_bytes(&self, address: usize, len: usize) -> Vec<u8> {
        let inner = self.lock();
        let region = inner
            .regions
            .iter()
            .find(|r| r.contains(address) && address + len <= r.end())
            .expect("get_bytes outside any mock region");
        let start = address - region.base;
        region.bytes[start..start + len].to_vec()
    }

    /// Shrinks the region at `base`, as if its tail became inaccessible
    pub fn shrink_region(&self, base: usize, new_len: usize) {
        let mut inner = self.lock();
        if let Some(region) = inner.regions.iter_mut().find(|r| r.base == base) {
            region.bytes.truncate(new_len);
        }
    }

    /// Caps the number of bytes any single read returns
    pub fn limit_reads(&self, cap: usize) {
        self.lock().read_cap = Some(cap);
    }

    /// Simulates process exit: every subsequent call fails
    pub fn kill(&self) {
        self.lock().exited = true;
    }
}

impl ProcessMemoryAccess for MockProcess {
    fn query_region(&self, probe: Address) -> ScanResult<Option<RegionQuery>> {
        let inner = self.lock();
        if inner.exited {
            return Err(ScanError::process_unavailable(0, "process exited"));
        }

        let probe = probe.as_usize();
        let region = inner
            .regions
            .iter()
            .filter(|r| r.end() > probe)
            .min_by_key(|r| r.base);

        match region {
            None => Ok(None),
            Some(r) if r.query_fails => Err(ScanError::region_query_failed(Address::new(r.base))),
            Some(r) => Ok(Some(RegionQuery {
                base: Address::new(r.base),
                size: r.bytes.len(),
                committed: r.committed,
                writable: r.writable,
            })),
        }
    }

    fn read_bytes(&self, address: Address, buf: &mut [u8]) -> ScanResult<usize> {
        let inner = self.lock();
        if inner.exited {
            return Err(ScanError::process_unavailable(0, "process exited"));
        }

        let addr = address.as_usize();
        let region = inner
            .regions
            .iter()
            .find(|r| r.contains(addr))
            .ok_or_else(|| ScanError::read_fault(address, "address not mapped"))?;

        let start = addr - region.base;
        let mut len = buf.len().min(region.bytes.len() - start);
        if let Some(cap) = inner.read_cap {
            len = len.min(cap);
        }
        buf[..len].copy_from_slice(&region.bytes[start..start + len]);
        Ok(len)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> ScanResult<()> {
        let mut inner = self.lock();
        if inner.exited {
            return Err(ScanError::write_fault(address, "process exited"));
        }

        let addr = address.as_usize();
        let region = inner
            .regions
            .iter_mut()
            .find(|r| r.contains(addr))
            .ok_or_else(|| ScanError::write_fault(address, "address not mapped"))?;

        if !region.writable {
            return Err(ScanError::write_fault(address, "region not writable"));
        }
        let start = addr - region.base;
        if start + data.len() > region.bytes.len() {
            return Err(ScanError::write_fault(address, "write past end of region"));
        }
        region.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}
