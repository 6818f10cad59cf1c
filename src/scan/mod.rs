//! The incremental narrowing scan engine.
//!
//! A scan session snapshots every writable region of the target, then
//! repeatedly re-reads live memory and narrows a per-byte candidate mask:
//! candidates can only ever be removed, never re-added. Surviving
//! addresses can be listed with their live values and edited in place.

mod block;
mod condition;
mod poke;
mod regions;
mod session;

pub use block::CandidateBlock;
pub use condition::ScanCondition;
pub use poke::{peek, poke};
pub use regions::{enumerate_writable_regions, MemoryRegion};
pub use session::{ScanMatch, ScanSession};
