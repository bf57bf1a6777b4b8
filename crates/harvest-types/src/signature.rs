//! The structured state key of the learned value table.
//!
//! A [`StateSignature`] is a coarse observation of one unit: two resource
//! buckets plus what lies in the four orthogonal neighbor cells. Neighbor
//! arrays follow [`Direction::ALL`] order (up, down, left, right).
//!
//! [`Direction::ALL`]: crate::grid::Direction::ALL

use serde::{Deserialize, Serialize};

/// Fuel level bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelBucket {
    /// Fuel above the refuel threshold.
    High,
    /// Fuel at or below the refuel threshold.
    Low,
}

/// Cargo load bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBucket {
    /// Load has reached capacity.
    Full,
    /// There is room for more cargo.
    NotFull,
}

/// Crop indicator for one neighbor cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropSignal {
    /// The neighbor lies outside the field (`-1`).
    OutOfBounds,
    /// In bounds but nothing to harvest (`0`).
    Bare,
    /// A ready crop (`1`).
    Ready,
}

impl CropSignal {
    /// The numeric indicator in `{-1, 0, 1}`.
    pub const fn indicator(self) -> i8 {
        match self {
            Self::OutOfBounds => -1,
            Self::Bare => 0,
            Self::Ready => 1,
        }
    }
}

/// Value-table key: what a unit observes about itself and its surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateSignature {
    /// Fuel bucket.
    pub fuel: FuelBucket,
    /// Load bucket.
    pub load: LoadBucket,
    /// Crop indicator per neighbor (up, down, left, right).
    pub crops: [CropSignal; 4],
    /// Whether another unit stands on each neighbor (up, down, left, right).
    pub occupied: [bool; 4],
}

impl StateSignature {
    /// Occupancy indicators in `{0, 1}`.
    pub fn occupancy_indicators(&self) -> [u8; 4] {
        self.occupied.map(u8::from)
    }

    /// Crop indicators in `{-1, 0, 1}`.
    pub fn crop_indicators(&self) -> [i8; 4] {
        self.crops.map(CropSignal::indicator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicators_match_encoding() {
        let sig = StateSignature {
            fuel: FuelBucket::High,
            load: LoadBucket::NotFull,
            crops: [
                CropSignal::OutOfBounds,
                CropSignal::Ready,
                CropSignal::Bare,
                CropSignal::Ready,
            ],
            occupied: [false, true, false, false],
        };
        assert_eq!(sig.crop_indicators(), [-1, 1, 0, 1]);
        assert_eq!(sig.occupancy_indicators(), [0, 1, 0, 0]);
    }
}
