//! Grid cell coordinates.

use serde::{Deserialize, Serialize};

/// Position of a planting cell on the farm grid.
///
/// `x` runs along a row, `z` selects the row. Cells are enumerated
/// row-major, which is the order used for persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    /// Column within the row
    pub x: u16,
    /// Row index
    pub z: u16,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: u16, z: u16) -> Self {
        Self { x, z }
    }

    /// Converts to a linear row-major index for a grid of the given width.
    #[must_use]
    pub const fn to_index(self, width: u16) -> usize {
        (self.z as usize) * (width as usize) + (self.x as usize)
    }

    /// Creates from a linear row-major index.
    #[must_use]
    pub const fn from_index(index: usize, width: u16) -> Self {
        let width = width as usize;
        Self {
            x: (index % width) as u16,
            z: (index / width) as u16,
        }
    }

    /// Checks whether the cell lies inside a `width` x `height` grid.
    #[must_use]
    pub const fn is_within(self, width: u16, height: u16) -> bool {
        self.x < width && self.z < height
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_order() {
        assert_eq!(CellCoord::new(0, 0).to_index(6), 0);
        assert_eq!(CellCoord::new(5, 0).to_index(6), 5);
        assert_eq!(CellCoord::new(0, 1).to_index(6), 6);
        assert_eq!(CellCoord::from_index(23, 6), CellCoord::new(5, 3));
    }

    #[test]
    fn test_is_within() {
        assert!(CellCoord::new(5, 3).is_within(6, 4));
        assert!(!CellCoord::new(6, 0).is_within(6, 4));
        assert!(!CellCoord::new(0, 4).is_within(6, 4));
    }
}
