//! Scan session orchestration.
//!
//! A [`ScanSession`] owns the access capability and one [`CandidateBlock`]
//! per writable region, and drives narrowing passes across all of them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::access::ProcessMemoryAccess;
use crate::config::ScannerConfig;
use crate::core::types::{Address, ScanError, ScanResult, ScanWidth};
use crate::scan::block::CandidateBlock;
use crate::scan::condition::ScanCondition;
use crate::scan::poke::{peek, poke};
use crate::scan::regions::enumerate_writable_regions;

/// One surviving address with its live value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMatch {
    pub address: Address,
    pub value: u32,
}

/// An in-progress incremental scan against one target process.
///
/// Bound to one process and one element width for its whole lifetime.
/// Match counts are valid from the moment the session exists: starting a
/// scan runs the initial pass over every block before returning.
pub struct ScanSession<A: ProcessMemoryAccess> {
    access: A,
    width: ScanWidth,
    chunk_size: usize,
    blocks: Vec<CandidateBlock>,
}

impl<A: ProcessMemoryAccess> ScanSession<A> {
    /// Starts a scan with the default scanner configuration
    pub fn start(access: A, width: ScanWidth, condition: ScanCondition) -> ScanResult<Self> {
        Self::start_with(access, width, condition, &ScannerConfig::default())
    }

    /// Enumerates the target's writable regions, builds one candidate
    /// block per region and immediately applies the initial pass
    /// (unconditional for an unknown start value, exact-equals otherwise).
    pub fn start_with(
        access: A,
        width: ScanWidth,
        condition: ScanCondition,
        config: &ScannerConfig,
    ) -> ScanResult<Self> {
        let regions = enumerate_writable_regions(&access)?;
        let blocks = regions
            .iter()
            .map(|region| CandidateBlock::new(region.base, region.size, width))
            .collect();

        // Passes evaluate elements at chunk-relative offsets, so a chunk
        // that is not a whole number of elements would leave the element
        // straddling each chunk boundary untested. Round down to a
        // multiple of the width, never below one element.
        let chunk_size = {
            let wanted = config.chunk_size.max(width.size());
            wanted - wanted % width.size()
        };

        let mut session = ScanSession {
            access,
            width,
            chunk_size,
            blocks,
        };
        session.run_pass(condition);
        debug!(
            blocks = session.blocks.len(),
            matches = session.total_matches(),
            "scan session started"
        );
        Ok(session)
    }

    /// Applies one narrowing pass to every block.
    ///
    /// Unconditional is rejected: it is only meaningful as the initial
    /// population pass, and allowing it later would violate the
    /// remove-only narrowing contract.
    pub fn narrow(&mut self, condition: ScanCondition) -> ScanResult<()> {
        if condition.is_initial_only() {
            return Err(ScanError::InvalidCondition(
                "unconditional passes are only valid when a scan starts".to_string(),
            ));
        }
        self.run_pass(condition);
        debug!(matches = self.total_matches(), "narrowing pass complete");
        Ok(())
    }

    fn run_pass(&mut self, condition: ScanCondition) {
        // One scratch allocation per pass invocation, shared across blocks
        let mut scratch = vec![0u8; self.chunk_size];
        let access = &self.access;
        for block in &mut self.blocks {
            block.apply_pass(access, condition, &mut scratch);
        }
    }

    /// Surviving candidates across all blocks
    pub fn total_matches(&self) -> usize {
        self.blocks.iter().map(CandidateBlock::match_count).sum()
    }

    /// Lazily yields every surviving address with its live value.
    ///
    /// Values are re-read from the target at enumeration time, never taken
    /// from the cached snapshots, so they are current even between passes.
    /// A candidate whose point read faults yields the error instead.
    pub fn matches(&self) -> impl Iterator<Item = ScanResult<ScanMatch>> + '_ {
        self.blocks.iter().flat_map(move |block| {
            block.surviving_offsets().map(move |offset| {
                let address = block.base_address().offset(offset);
                peek(&self.access, address, self.width)
                    .map(|value| ScanMatch { address, value })
            })
        })
    }

    /// Reads one scalar at the session's element width
    pub fn peek(&self, address: Address) -> ScanResult<u32> {
        peek(&self.access, address, self.width)
    }

    /// Writes one scalar at the session's element width
    pub fn poke(&self, address: Address, value: u32) -> ScanResult<()> {
        poke(&self.access, address, self.width, value)
    }

    pub fn width(&self) -> ScanWidth {
        self.width
    }

    /// The blocks backing this session, in region order
    pub fn blocks(&self) -> &[CandidateBlock] {
        &self.blocks
    }

    pub fn access(&self) -> &A {
        &self.access
    }
}
