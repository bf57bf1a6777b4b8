//! Type-safe identifier wrappers.
//!
//! Units are created once at simulation start and never removed, so their
//! identifiers are dense indices (`0..unit_count`). The numeric order of a
//! [`UnitId`] is also the fixed order in which units act within a step,
//! which makes it part of the observable contract rather than an
//! implementation detail.

use serde::{Deserialize, Serialize};

/// Unique, stable identifier for a harvesting unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Create an identifier from its raw index.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Return the raw index.
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for UnitId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

impl From<u32> for UnitId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}
