//! Transform handle type.

use serde::{Deserialize, Serialize};

/// A stable handle into the transform storage.
///
/// Handles are dense `u32` slot indices. Slot 0 is reserved for the
/// engine default transform and is never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformId(u32);

impl TransformId {
    /// The invalid handle.
    pub const INVALID: Self = Self(u32::MAX);

    /// Wrap a raw slot index.
    #[inline]
    pub(crate) const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Raw slot index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Check that this is not the invalid handle.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for TransformId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Display for TransformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "invalid")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid() {
        assert!(!TransformId::INVALID.is_valid());
        assert!(TransformId::from_index(1).is_valid());
        assert_eq!(TransformId::default(), TransformId::INVALID);
    }

    #[test]
    fn test_display() {
        assert_eq!(TransformId::from_index(7).to_string(), "7");
        assert_eq!(TransformId::INVALID.to_string(), "invalid");
    }
}
