//! Protocol generations. Only the third one is spoken here; the first two used different header layouts and type
//! codes and can't be told apart from garbage.

use crate::error::DecodeError;

/// The version written into the leading byte of top level records.
pub const CURRENT: u8 = 3;

/// Every version this decoder accepts.
pub const SUPPORTED: &[u8] = &[3];

pub fn is_supported(version: u8) -> bool {
    SUPPORTED.contains(&version)
}

pub fn check(version: u8) -> Result<u8, DecodeError> {
    if is_supported(version) {
        Ok(version)
    } else {
        Err(DecodeError::Version(version))
    }
}
