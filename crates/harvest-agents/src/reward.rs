//! Reward schedule for the learned policy.
//!
//! Every acted step pays [`TIME_COST`] on top of the outcome reward, so a
//! successful harvest nets `+9` and a collision `-101`.

/// Charged on every step the unit acts.
pub const TIME_COST: f64 = -1.0;

/// Moving into a cell held by another unit. The move is rejected.
pub const COLLISION: f64 = -100.0;

/// Moving off the field. The move is rejected.
pub const OUT_OF_BOUNDS: f64 = -10.0;

/// Harvesting a ready parcel.
pub const HARVEST: f64 = 10.0;

/// Unloading cargo at the unload point.
pub const UNLOAD: f64 = 5.0;

/// Refueling at the refuel station.
pub const REFUEL: f64 = 5.0;

/// Harvest, unload, or refuel where it has no effect.
pub const INVALID_ACTION: f64 = -5.0;

/// A successful move carries no outcome reward.
pub const MOVE: f64 = 0.0;
