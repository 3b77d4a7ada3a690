//! Identifier types.

use serde::{Deserialize, Serialize};

/// Identifier of a planting spot: its position in grid enumeration order.
///
/// Ids are stable for the lifetime of a grid and double as the index of the
/// spot's entry in a save document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpotId(usize);

impl SpotId {
    /// Creates a spot id from an enumeration index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Returns the enumeration index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SpotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "spot#{}", self.0)
    }
}
