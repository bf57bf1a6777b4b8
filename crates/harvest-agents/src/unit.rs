//! Harvest unit state.
//!
//! A [`Unit`] owns its resources, its operational state, and its policy.
//! Its position is not stored here: the [`FieldGrid`] occupancy index is the
//! single source of truth for where a unit stands.
//!
//! [`FieldGrid`]: harvest_world::FieldGrid

use harvest_types::{GridPos, OperationalState, UnitId, UnitSnapshot};

use crate::config::UnitParams;
use crate::policy::AgentPolicy;
use crate::value_table::ValueTable;

/// One harvest unit (tractor).
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub(crate) id: UnitId,
    pub(crate) fuel: u32,
    pub(crate) load: u32,
    pub(crate) state: OperationalState,
    pub(crate) fuel_used: u64,
    pub(crate) policy: AgentPolicy,
}

impl Unit {
    /// A new unit with a full tank and no cargo.
    pub const fn new(id: UnitId, params: &UnitParams, policy: AgentPolicy) -> Self {
        Self {
            id,
            fuel: params.max_fuel,
            load: 0,
            state: OperationalState::Active,
            fuel_used: 0,
            policy,
        }
    }

    /// Unit identifier.
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Current fuel level.
    pub const fn fuel(&self) -> u32 {
        self.fuel
    }

    /// Current cargo load.
    pub const fn load(&self) -> u32 {
        self.load
    }

    /// Operational state.
    pub const fn state(&self) -> OperationalState {
        self.state
    }

    /// Total fuel consumed since the run started.
    pub const fn fuel_used(&self) -> u64 {
        self.fuel_used
    }

    /// The unit's policy.
    pub const fn policy(&self) -> &AgentPolicy {
        &self.policy
    }

    /// The unit's value table, if it learns.
    pub const fn value_table(&self) -> Option<&ValueTable> {
        self.policy.value_table()
    }

    /// Overwrite the fuel level, clamped to the tank size.
    pub fn set_fuel(&mut self, fuel: u32, params: &UnitParams) {
        self.fuel = fuel.min(params.max_fuel);
    }

    /// Overwrite the cargo load, clamped to capacity.
    pub fn set_load(&mut self, load: u32, params: &UnitParams) {
        self.load = load.min(params.capacity);
    }

    /// Read-only view for renderers.
    pub const fn snapshot(&self, position: Option<GridPos>) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            position,
            fuel: self.fuel,
            load: self.load,
            state: self.state,
        }
    }

    /// Burn fuel for one move. Returns the amount actually burned.
    pub(crate) fn consume_fuel(&mut self, rate: u32) -> u32 {
        let burned = rate.min(self.fuel);
        self.fuel = self.fuel.saturating_sub(burned);
        self.fuel_used = self.fuel_used.saturating_add(u64::from(burned));
        burned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_unit_is_fueled_and_empty() {
        let params = UnitParams::default();
        let unit = Unit::new(UnitId::new(2), &params, AgentPolicy::Priority);
        assert_eq!(unit.fuel(), params.max_fuel);
        assert_eq!(unit.load(), 0);
        assert!(unit.state().is_active());
        assert!(unit.value_table().is_none());
    }

    #[test]
    fn fuel_never_goes_negative() {
        let params = UnitParams::default();
        let mut unit = Unit::new(UnitId::new(0), &params, AgentPolicy::Priority);
        unit.set_fuel(1, &params);
        assert_eq!(unit.consume_fuel(3), 1);
        assert_eq!(unit.fuel(), 0);
        assert_eq!(unit.fuel_used(), 1);
    }

    #[test]
    fn setters_clamp() {
        let params = UnitParams::default();
        let mut unit = Unit::new(UnitId::new(0), &params, AgentPolicy::Priority);
        unit.set_load(500, &params);
        unit.set_fuel(500, &params);
        assert_eq!(unit.load(), params.capacity);
        assert_eq!(unit.fuel(), params.max_fuel);
    }
}
