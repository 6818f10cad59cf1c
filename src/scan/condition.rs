//! Narrowing conditions

/// The predicate one narrowing pass applies to every surviving candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCondition {
    /// Keep every offset that was read. Only meaningful as the very first
    /// pass of a scan that starts from an unknown value.
    Unconditional,
    /// Current value equals the reference value
    Equals(u32),
    /// Current value is greater than the previous snapshot (unsigned)
    Increased,
    /// Current value is less than the previous snapshot (unsigned)
    Decreased,
}

impl ScanCondition {
    /// True for conditions only valid when a scan starts
    pub fn is_initial_only(&self) -> bool {
        matches!(self, ScanCondition::Unconditional)
    }
}
