//! Discrete grid coordinates and 4-connected directions.
//!
//! The field is a `width x height` rectangle addressed by `(x, y)` with the
//! origin in the top-left corner: `x` grows to the right, `y` grows
//! downwards. [`GridPos`] orders row-major (`y` first, then `x`), which is
//! the enumeration order used everywhere a deterministic "first found" rule
//! applies.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A cell coordinate on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    /// Column index (0 = left edge).
    pub x: u32,
    /// Row index (0 = top edge).
    pub y: u32,
}

impl GridPos {
    /// Create a coordinate.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Return the orthogonal neighbor in `direction`, or `None` if it would
    /// leave a `width x height` field.
    pub fn step(self, direction: Direction, width: u32, height: u32) -> Option<Self> {
        let (x, y) = match direction {
            Direction::Up => (Some(self.x), self.y.checked_sub(1)),
            Direction::Down => (Some(self.x), self.y.checked_add(1)),
            Direction::Left => (self.x.checked_sub(1), Some(self.y)),
            Direction::Right => (self.x.checked_add(1), Some(self.y)),
        };
        let (x, y) = (x?, y?);
        (x < width && y < height).then_some(Self { x, y })
    }
}

impl Ord for GridPos {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for GridPos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl core::fmt::Display for GridPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four orthogonal movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards row 0.
    Up,
    /// Away from row 0.
    Down,
    /// Towards column 0.
    Left,
    /// Away from column 0.
    Right,
}

impl Direction {
    /// All directions in canonical order. Neighbor enumeration and the
    /// value-table signature both follow this order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
}

/// Manhattan (taxicab) distance between two cells.
pub const fn manhattan_distance(a: GridPos, b: GridPos) -> u32 {
    a.x.abs_diff(b.x).saturating_add(a.y.abs_diff(b.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_stays_in_bounds() {
        let corner = GridPos::new(0, 0);
        assert_eq!(corner.step(Direction::Up, 5, 5), None);
        assert_eq!(corner.step(Direction::Left, 5, 5), None);
        assert_eq!(corner.step(Direction::Down, 5, 5), Some(GridPos::new(0, 1)));
        assert_eq!(corner.step(Direction::Right, 5, 5), Some(GridPos::new(1, 0)));

        let far = GridPos::new(4, 4);
        assert_eq!(far.step(Direction::Down, 5, 5), None);
        assert_eq!(far.step(Direction::Right, 5, 5), None);
    }

    #[test]
    fn ordering_is_row_major() {
        let mut cells = vec![GridPos::new(1, 0), GridPos::new(0, 1), GridPos::new(0, 0)];
        cells.sort();
        assert_eq!(
            cells,
            vec![GridPos::new(0, 0), GridPos::new(1, 0), GridPos::new(0, 1)]
        );
    }

    #[test]
    fn manhattan_is_symmetric() {
        let a = GridPos::new(1, 4);
        let b = GridPos::new(3, 0);
        assert_eq!(manhattan_distance(a, b), 6);
        assert_eq!(manhattan_distance(b, a), 6);
        assert_eq!(manhattan_distance(a, a), 0);
    }
}
