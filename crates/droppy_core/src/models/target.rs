//! Target byte budget.

use serde::{Deserialize, Serialize};

use crate::compress::{CompressError, CompressResult};

/// Maximum output size a compression result must not exceed.
///
/// Always strictly positive. Units are decimal (1 KB = 1000 bytes), matching
/// what Finder reports for file sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct TargetSize(u64);

impl TargetSize {
    /// Create a target from a byte count.
    pub fn from_bytes(bytes: u64) -> CompressResult<Self> {
        if bytes == 0 {
            return Err(CompressError::InvalidTarget);
        }
        Ok(Self(bytes))
    }

    /// Create a target from kilobytes.
    pub fn from_kilobytes(kb: f64) -> CompressResult<Self> {
        Self::from_scaled(kb, 1_000.0)
    }

    /// Create a target from megabytes.
    pub fn from_megabytes(mb: f64) -> CompressResult<Self> {
        Self::from_scaled(mb, 1_000_000.0)
    }

    fn from_scaled(value: f64, scale: f64) -> CompressResult<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CompressError::InvalidTarget);
        }
        Self::from_bytes((value * scale).floor() as u64)
    }

    /// Byte count.
    pub fn bytes(&self) -> u64 {
        self.0
    }

    /// Whether a buffer of `len` bytes fits within the budget.
    pub fn fits(&self, len: u64) -> bool {
        len <= self.0
    }
}

impl TryFrom<u64> for TargetSize {
    type Error = CompressError;

    fn try_from(bytes: u64) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl From<TargetSize> for u64 {
    fn from(target: TargetSize) -> Self {
        target.0
    }
}

impl std::fmt::Display for TargetSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 >= 1_000_000 {
            write!(f, "{:.2} MB", self.0 as f64 / 1_000_000.0)
        } else if self.0 >= 1_000 {
            write!(f, "{:.1} KB", self.0 as f64 / 1_000.0)
        } else {
            write!(f, "{} B", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_negative() {
        assert!(matches!(
            TargetSize::from_bytes(0),
            Err(CompressError::InvalidTarget)
        ));
        assert!(TargetSize::from_megabytes(-1.0).is_err());
        assert!(TargetSize::from_kilobytes(f64::NAN).is_err());
        // Rounds down to zero bytes
        assert!(TargetSize::from_kilobytes(0.0001).is_err());
    }

    #[test]
    fn decimal_units() {
        assert_eq!(TargetSize::from_kilobytes(500.0).unwrap().bytes(), 500_000);
        assert_eq!(TargetSize::from_megabytes(2.5).unwrap().bytes(), 2_500_000);
    }

    #[test]
    fn fits_is_inclusive() {
        let target = TargetSize::from_bytes(100).unwrap();
        assert!(target.fits(100));
        assert!(!target.fits(101));
    }

    #[test]
    fn deserialize_rejects_zero() {
        assert!(serde_json::from_str::<TargetSize>("0").is_err());
        let target: TargetSize = serde_json::from_str("2048").unwrap();
        assert_eq!(target.bytes(), 2048);
    }

    #[test]
    fn display_picks_unit() {
        assert_eq!(TargetSize::from_bytes(512).unwrap().to_string(), "512 B");
        assert_eq!(TargetSize::from_bytes(500_000).unwrap().to_string(), "500.0 KB");
        assert_eq!(TargetSize::from_bytes(2_500_000).unwrap().to_string(), "2.50 MB");
    }
}
