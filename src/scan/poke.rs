//! Point read/write of a single scalar.
//!
//! Used internally to show live values for surviving candidates, and
//! externally for the final edit once a scan has narrowed down to an
//! address.

use crate::access::ProcessMemoryAccess;
use crate::core::types::{Address, ScanError, ScanResult, ScanWidth};

/// Reads one scalar of `width` bytes at `address`.
///
/// A short read is a `ReadFault` here: unlike bulk snapshot reads, a point
/// read has no truncation to fall back on.
pub fn peek<A: ProcessMemoryAccess>(
    access: &A,
    address: Address,
    width: ScanWidth,
) -> ScanResult<u32> {
    let mut buf = [0u8; 4];
    let wanted = width.size();
    let read = access.read_bytes(address, &mut buf[..wanted])?;
    if read < wanted {
        return Err(ScanError::read_fault(address, "short read"));
    }
    Ok(width.decode(&buf[..wanted]))
}

/// Writes one scalar of `width` bytes at `address`.
///
/// The write is visible to the target immediately; there is no rollback on
/// failure.
pub fn poke<A: ProcessMemoryAccess>(
    access: &A,
    address: Address,
    width: ScanWidth,
    value: u32,
) -> ScanResult<()> {
    access.write_bytes(address, &width.encode(value))
}
