#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity token naming the logical owner a raise is addressed to.
///
/// Many owners of the same behavior type share one channel; a selective subscription only runs
/// when the raise carries the selector it was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selector(u64);

impl Selector {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl From<u64> for Selector {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u32> for Selector {
    fn from(value: u32) -> Self {
        Self(value as u64)
    }
}

impl From<usize> for Selector {
    fn from(value: usize) -> Self {
        Self(value as u64)
    }
}
