//! Per-region candidate tracking.
//!
//! A [`CandidateBlock`] owns a snapshot of one writable region and a
//! packed bitmask with one bit per byte offset. Each narrowing pass
//! re-reads live memory in bounded chunks, clears the bit of every
//! candidate that fails the condition, and overwrites the snapshot so the
//! next pass compares against what was just read. Bits only ever go from
//! set to clear within a session; the sole exception is the unconditional
//! population pass a fresh scan starts with.

use crate::access::ProcessMemoryAccess;
use crate::core::types::{Address, ScanWidth};
use crate::scan::condition::ScanCondition;
use tracing::trace;

/// Packed bitmask, one bit per byte offset of the tracked region.
///
/// Only bits at width-aligned offsets are ever tested; the rest is inert
/// padding from the byte-granular encoding. Bits past the tracked length
/// (the tail of the last mask byte) are held clear.
#[derive(Debug, Clone)]
struct CandidateMask {
    bits: Vec<u8>,
}

impl CandidateMask {
    fn all_set(len: usize) -> Self {
        let mut mask = CandidateMask {
            bits: vec![0xFF; len.div_ceil(8)],
        };
        mask.clear_tail(len);
        mask
    }

    fn test(&self, offset: usize) -> bool {
        self.bits
            .get(offset / 8)
            .is_some_and(|byte| byte & (1 << (offset % 8)) != 0)
    }

    fn set(&mut self, offset: usize) {
        if let Some(byte) = self.bits.get_mut(offset / 8) {
            *byte |= 1 << (offset % 8);
        }
    }

    fn clear(&mut self, offset: usize) {
        if let Some(byte) = self.bits.get_mut(offset / 8) {
            *byte &= !(1 << (offset % 8));
        }
    }

    /// Sets every bit in `start..end`, whole bytes at a time in the middle
    fn set_range(&mut self, start: usize, end: usize) {
        let mut offset = start;
        while offset < end && offset % 8 != 0 {
            self.set(offset);
            offset += 1;
        }
        while offset + 8 <= end {
            self.bits[offset / 8] = 0xFF;
            offset += 8;
        }
        while offset < end {
            self.set(offset);
            offset += 1;
        }
    }

    /// Shrinks the mask to cover `len` bytes; bits at offsets >= len drop
    fn truncate(&mut self, len: usize) {
        self.bits.truncate(len.div_ceil(8));
        self.clear_tail(len);
    }

    fn clear_tail(&mut self, len: usize) {
        if len % 8 != 0 {
            if let Some(last) = self.bits.last_mut() {
                *last &= (1u8 << (len % 8)) - 1;
            }
        }
    }

    fn len_bytes(&self) -> usize {
        self.bits.len()
    }
}

/// Snapshot, candidate mask and match bookkeeping for one memory region;
/// the unit of incremental narrowing.
#[derive(Debug)]
pub struct CandidateBlock {
    base: Address,
    size: usize,
    width: ScanWidth,
    snapshot: Vec<u8>,
    mask: CandidateMask,
    matches: usize,
}

impl CandidateBlock {
    /// Creates a block covering `size` bytes at `base` with every offset a
    /// candidate.
    ///
    /// The initial match count is optimistic (`size`); the session always
    /// runs a first pass immediately, which corrects it.
    pub fn new(base: Address, size: usize, width: ScanWidth) -> Self {
        CandidateBlock {
            base,
            size,
            width,
            snapshot: vec![0; size],
            mask: CandidateMask::all_set(size),
            matches: size,
        }
    }

    pub fn base_address(&self) -> Address {
        self.base
    }

    /// Currently tracked length in bytes; shrinks when a live re-read
    /// comes back short
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn width(&self) -> ScanWidth {
        self.width
    }

    /// Number of surviving width-aligned candidates after the last pass
    pub fn match_count(&self) -> usize {
        self.matches
    }

    /// A block with no surviving candidates stays inert for the rest of
    /// the session
    pub fn is_exhausted(&self) -> bool {
        self.matches == 0
    }

    /// Bytes read during the most recent pass
    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }

    /// Runs one narrowing pass over this block.
    ///
    /// Live memory is re-read through `scratch` in bounded chunks. A short
    /// or failed chunk read stops the pass and truncates the block to the
    /// bytes actually read; work already done on earlier chunks is kept.
    /// Read faults never escape here — a block that can no longer be read
    /// simply shrinks, possibly to nothing.
    pub fn apply_pass<A: ProcessMemoryAccess>(
        &mut self,
        access: &A,
        condition: ScanCondition,
        scratch: &mut [u8],
    ) {
        if self.matches == 0 || scratch.is_empty() {
            return;
        }

        let width = self.width.size();
        let mut total_read = 0usize;

        while total_read < self.size {
            let want = (self.size - total_read).min(scratch.len());
            let read = access
                .read_bytes(self.base.offset(total_read), &mut scratch[..want])
                .unwrap_or(0);
            if read == 0 {
                break;
            }

            let chunk = &scratch[..read];
            if condition == ScanCondition::Unconditional {
                self.mask.set_range(total_read, total_read + read);
            } else {
                let mut offset = 0;
                while offset + width <= read {
                    let at = total_read + offset;
                    if self.mask.test(at) {
                        let current = self.width.decode(&chunk[offset..offset + width]);
                        let keep = match condition {
                            ScanCondition::Equals(value) => current == value,
                            ScanCondition::Increased => {
                                current > self.width.decode(&self.snapshot[at..at + width])
                            }
                            ScanCondition::Decreased => {
                                current < self.width.decode(&self.snapshot[at..at + width])
                            }
                            ScanCondition::Unconditional => unreachable!(),
                        };
                        if !keep {
                            self.mask.clear(at);
                        }
                    }
                    offset += width;
                }
            }

            self.snapshot[total_read..total_read + read].copy_from_slice(chunk);
            total_read += read;
            if read < want {
                break;
            }
        }

        if total_read < self.size {
            trace!(base = %self.base, from = self.size, to = total_read, "block truncated");
            self.size = total_read;
            self.snapshot.truncate(total_read);
            self.mask.truncate(total_read);
        }

        self.matches = self.surviving_offsets().count();
    }

    /// Width-aligned offsets whose candidate bit is set, ascending.
    ///
    /// Tied to the current mask and size; request a fresh iterator after
    /// any later pass.
    pub fn surviving_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        let width = self.width.size();
        // Offsets whose full element fits inside the tracked size
        (0..self.size.saturating_sub(width - 1))
            .step_by(width)
            .filter(move |&offset| self.mask.test(offset))
    }
}
