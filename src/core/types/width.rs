//! Element width of the scanned scalar value

use tracing::warn;

/// Byte width of the value being searched for at each candidate offset.
///
/// Values are carried as `u32` and compared unsigned at this width.
/// Decoding uses native byte order: the scanner reads the target's raw
/// memory on the same machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScanWidth {
    U8,
    U16,
    #[default]
    U32,
}

impl ScanWidth {
    /// Maps a requested byte count to a width.
    ///
    /// Anything other than 1, 2 or 4 falls back to 4 bytes instead of
    /// failing; the fallback is logged.
    pub fn from_bytes(bytes: usize) -> Self {
        match bytes {
            1 => ScanWidth::U8,
            2 => ScanWidth::U16,
            4 => ScanWidth::U32,
            other => {
                warn!(requested = other, "unsupported element width, using 4 bytes");
                ScanWidth::U32
            }
        }
    }

    /// Width in bytes
    pub const fn size(self) -> usize {
        match self {
            ScanWidth::U8 => 1,
            ScanWidth::U16 => 2,
            ScanWidth::U32 => 4,
        }
    }

    /// Decodes one element from the front of `bytes`.
    ///
    /// `bytes` must hold at least `self.size()` bytes.
    pub fn decode(self, bytes: &[u8]) -> u32 {
        match self {
            ScanWidth::U8 => bytes[0] as u32,
            ScanWidth::U16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u32,
            ScanWidth::U32 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }

    /// Encodes `value` at this width, truncating high bits
    pub fn encode(self, value: u32) -> Vec<u8> {
        match self {
            ScanWidth::U8 => vec![value as u8],
            ScanWidth::U16 => (value as u16).to_ne_bytes().to_vec(),
            ScanWidth::U32 => value.to_ne_bytes().to_vec(),
        }
    }
}
