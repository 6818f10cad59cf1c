//! Writable-region enumeration

use tracing::debug;

use crate::access::ProcessMemoryAccess;
use crate::core::types::{Address, ScanError, ScanResult};

const PAGE_SIZE: usize = 4096;

/// A committed, writable region picked up as a scan target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base: Address,
    pub size: usize,
}

/// Walks the target address space from address 0 and collects every
/// committed region whose protection grants write access, in ascending
/// address order.
///
/// A single failed probe is skipped by stepping one page forward; only a
/// dead handle (`ProcessUnavailable`) aborts the enumeration.
pub fn enumerate_writable_regions<A: ProcessMemoryAccess>(
    access: &A,
) -> ScanResult<Vec<MemoryRegion>> {
    let mut regions = Vec::new();
    let mut probe = Address::null();

    loop {
        match access.query_region(probe) {
            Ok(Some(query)) => {
                if query.committed && query.writable && query.size > 0 {
                    regions.push(MemoryRegion {
                        base: query.base,
                        size: query.size,
                    });
                }
                // Advance past the reported region; a non-advancing answer
                // is stepped over one page so the walk always terminates.
                probe = match query.end() {
                    Some(end) if end > probe.as_usize() => Address::new(end),
                    _ => match step_page(probe) {
                        Some(next) => next,
                        None => break,
                    },
                };
            }
            Ok(None) => break,
            Err(err @ ScanError::ProcessUnavailable { .. }) => return Err(err),
            Err(err) => {
                debug!(%probe, %err, "skipping unqueryable region");
                probe = match step_page(probe) {
                    Some(next) => next,
                    None => break,
                };
            }
        }
    }

    debug!(count = regions.len(), "writable regions enumerated");
    Ok(regions)
}

fn step_page(probe: Address) -> Option<Address> {
    probe.as_usize().checked_add(PAGE_SIZE).map(Address::new)
}
