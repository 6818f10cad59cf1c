mod address;
mod error;
mod width;

pub use address::Address;
pub use error::{ScanError, ScanResult};
pub use width::ScanWidth;
