//! Memory address wrapper type with hex parsing

use super::error::ScanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An address in the target process's address space.
///
/// Address width follows the host pointer width; arithmetic never assumes
/// a 32-bit address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub usize);

impl Address {
    /// Creates a new address from a usize value
    pub const fn new(value: usize) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Adds a byte offset to the address
    pub const fn offset(&self, offset: usize) -> Self {
        Address(self.0 + offset)
    }

    /// Returns the raw usize value
    pub const fn as_usize(&self) -> usize {
        self.0
    }
}

impl FromStr for Address {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            usize::from_str_radix(hex, 16)
        } else {
            // Decimal first, bare hex as a fallback
            s.parse::<usize>().or_else(|_| usize::from_str_radix(s, 16))
        };

        value
            .map(Address::new)
            .map_err(|_| ScanError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0pad$X}", self.0, pad = usize::BITS as usize / 4)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0pad$x}", self.0, pad = usize::BITS as usize / 4)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parsing() {
        assert_eq!(Address::from_str("0x1000").unwrap(), Address::new(0x1000));
        assert_eq!(Address::from_str("0X1000").unwrap(), Address::new(0x1000));
        assert_eq!(
            Address::from_str("DEADBEEF").unwrap(),
            Address::new(0xDEAD_BEEF)
        );
        assert_eq!(Address::from_str("4096").unwrap(), Address::new(4096));
        assert_eq!(Address::from_str(" 0x20 ").unwrap(), Address::new(0x20));
        assert!(Address::from_str("not an address").is_err());
    }

    #[test]
    fn test_address_offset() {
        let addr = Address::new(0x1000);
        assert_eq!(addr.offset(0x10), Address::new(0x1010));
        assert_eq!(addr.offset(0), addr);
    }

    #[test]
    fn test_address_null() {
        assert!(Address::null().is_null());
        assert!(!Address::new(0x1000).is_null());
    }

    #[test]
    fn test_address_display() {
        let addr = Address::new(0xDEAD_BEEF);
        let shown = format!("{}", addr);
        assert!(shown.starts_with("0x"));
        assert!(shown.ends_with("DEADBEEF"));
        // Padded to the full pointer width of the host
        assert_eq!(shown.len(), 2 + usize::BITS as usize / 4);
    }
}
