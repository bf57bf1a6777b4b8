//! The per-step unit state machine.
//!
//! Each step a unit does exactly one of:
//!
//! 1. count down an ongoing repair,
//! 2. stall (no position or no fuel),
//! 3. consult its policy, move at most one cell, and apply at most one
//!    effect.
//!
//! A successful move burns fuel and then rolls for a breakdown. The outcome
//! is returned as an [`ActivityRecord`].

use harvest_types::{
    Action, ActivityRecord, ActivityStatus, CellState, Effect, GridPos, Movement,
    OperationalState, TargetKind,
};
use harvest_world::{FieldGrid, Heuristic, PathFinder, WorldError, roll};
use rand::Rng;
use tracing::{debug, warn};

use crate::config::UnitParams;
use crate::error::AgentError;
use crate::policy::{AgentPolicy, QLearner, priority_target};
use crate::reward;
use crate::signature::observe;
use crate::unit::Unit;

/// Advance one unit by one step.
///
/// # Errors
///
/// Returns [`AgentError::World`] only if the field rejects an operation the
/// state machine already validated, which indicates a corrupted grid.
pub fn step_unit<H: Heuristic>(
    unit: &mut Unit,
    grid: &mut FieldGrid,
    params: &UnitParams,
    pathfinder: &PathFinder<H>,
    rng: &mut impl Rng,
) -> Result<ActivityRecord, AgentError> {
    if let OperationalState::BrokenDown { remaining } = unit.state {
        let remaining = remaining.saturating_sub(1);
        unit.state = if remaining == 0 {
            OperationalState::Active
        } else {
            OperationalState::BrokenDown { remaining }
        };
        return Ok(ActivityRecord::passive(
            unit.id,
            ActivityStatus::Repairing { remaining },
        ));
    }

    let Some(pos) = grid.position_of(unit.id) else {
        warn!(unit = %unit.id, "Unit has no position; skipping");
        return Ok(ActivityRecord::passive(unit.id, ActivityStatus::Unplaced));
    };

    if unit.fuel == 0 {
        return Ok(ActivityRecord::passive(unit.id, ActivityStatus::Stalled));
    }

    // Take the policy out so the learner and the unit can be borrowed apart.
    let mut policy = std::mem::replace(&mut unit.policy, AgentPolicy::Priority);
    let result = match &mut policy {
        AgentPolicy::Priority => step_priority(unit, pos, grid, params, pathfinder, rng),
        AgentPolicy::Learned(learner) => step_learned(unit, learner, pos, grid, params, rng),
    };
    unit.policy = policy;
    result
}

/// Settle a learned unit's last transition against the final field.
///
/// Returns the updated estimate, or `None` for priority units, unplaced
/// units, and learners with nothing pending.
pub fn settle_pending(unit: &mut Unit, grid: &FieldGrid, params: &UnitParams) -> Option<f64> {
    let pos = grid.position_of(unit.id)?;
    let signature = observe(grid, unit.id, pos, unit.fuel, unit.load, params);
    match &mut unit.policy {
        AgentPolicy::Priority => None,
        AgentPolicy::Learned(learner) => learner.settle(&signature),
    }
}

// ---------------------------------------------------------------------------
// Priority policy
// ---------------------------------------------------------------------------

fn step_priority<H: Heuristic>(
    unit: &mut Unit,
    pos: GridPos,
    grid: &mut FieldGrid,
    params: &UnitParams,
    pathfinder: &PathFinder<H>,
    rng: &mut impl Rng,
) -> Result<ActivityRecord, AgentError> {
    let Some((kind, goal)) = priority_target(grid, pos, unit.fuel, unit.load, params) else {
        return Ok(ActivityRecord::passive(unit.id, ActivityStatus::Idle));
    };

    let mut record = ActivityRecord::acted(unit.id);
    record.target = Some(kind);

    let id = unit.id;
    let path = pathfinder.find_path(grid, pos, goal, |cell| {
        grid.occupant_at(cell).is_some_and(|other| other != id)
    });

    let Some(&next) = path.get(1) else {
        if pos == goal {
            record.movement = Some(Movement::Arrived);
            record.effect = Some(apply_target_effect(unit, kind, pos, grid, params)?);
        } else {
            record.movement = Some(Movement::NoRoute);
        }
        return Ok(record);
    };

    match grid.move_unit(unit.id, next) {
        Ok(from) => {
            record.movement = Some(Movement::Moved { from, to: next });
            record.broke_down = after_move(unit, params, rng);
            if next == goal {
                record.effect = Some(apply_target_effect(unit, kind, next, grid, params)?);
            }
        }
        Err(WorldError::Occupied { .. }) => {
            record.movement = Some(Movement::Blocked { toward: next });
        }
        Err(err) => return Err(err.into()),
    }
    Ok(record)
}

fn apply_target_effect(
    unit: &mut Unit,
    kind: TargetKind,
    at: GridPos,
    grid: &mut FieldGrid,
    params: &UnitParams,
) -> Result<Effect, AgentError> {
    let effect = match kind {
        TargetKind::UnloadPoint => unload(unit),
        TargetKind::RefuelStation => refuel(unit, params),
        TargetKind::Parcel => harvest(unit, at, grid, params)?,
    };
    debug!(unit = %unit.id, ?effect, "Target reached");
    Ok(effect)
}

// ---------------------------------------------------------------------------
// Learned policy
// ---------------------------------------------------------------------------

fn step_learned(
    unit: &mut Unit,
    learner: &mut QLearner,
    pos: GridPos,
    grid: &mut FieldGrid,
    params: &UnitParams,
    rng: &mut impl Rng,
) -> Result<ActivityRecord, AgentError> {
    let signature = observe(grid, unit.id, pos, unit.fuel, unit.load, params);
    learner.settle(&signature);

    let action = learner.choose(&signature, rng);
    let mut record = ActivityRecord::acted(unit.id);
    record.action = Some(action);

    let outcome = if let Some(direction) = action.direction() {
        match pos.step(direction, grid.width(), grid.height()) {
            None => {
                record.movement = Some(Movement::OutOfBounds);
                reward::OUT_OF_BOUNDS
            }
            Some(to) => match grid.move_unit(unit.id, to) {
                Ok(from) => {
                    record.movement = Some(Movement::Moved { from, to });
                    record.broke_down = after_move(unit, params, rng);
                    reward::MOVE
                }
                Err(WorldError::Occupied { .. }) => {
                    record.movement = Some(Movement::Blocked { toward: to });
                    reward::COLLISION
                }
                Err(err) => return Err(err.into()),
            },
        }
    } else {
        let (effect, outcome) = match action {
            Action::Harvest
                if grid.state_at(pos) == Some(CellState::ReadyToHarvest)
                    && unit.load < params.capacity =>
            {
                (harvest(unit, pos, grid, params)?, reward::HARVEST)
            }
            Action::Unload if pos == grid.unload_point() && unit.load > 0 => {
                (unload(unit), reward::UNLOAD)
            }
            Action::Refuel if pos == grid.refuel_station() => (refuel(unit, params), reward::REFUEL),
            _ => (Effect::Rejected { action }, reward::INVALID_ACTION),
        };
        record.effect = Some(effect);
        outcome
    };

    let total = reward::TIME_COST + outcome;
    learner.record(signature, action, total);
    record.reward = Some(total);
    Ok(record)
}

// ---------------------------------------------------------------------------
// Shared mechanics
// ---------------------------------------------------------------------------

/// Burn fuel for a completed move and roll for a breakdown. Returns whether
/// the unit broke down.
fn after_move(unit: &mut Unit, params: &UnitParams, rng: &mut impl Rng) -> bool {
    unit.consume_fuel(params.fuel_consumption_rate);
    let broke = roll(rng, params.breakdown_chance) && params.repair_steps > 0;
    if broke {
        unit.state = OperationalState::BrokenDown {
            remaining: params.repair_steps,
        };
        debug!(unit = %unit.id, repair_steps = params.repair_steps, "Unit broke down");
    }
    broke
}

fn harvest(
    unit: &mut Unit,
    at: GridPos,
    grid: &mut FieldGrid,
    params: &UnitParams,
) -> Result<Effect, AgentError> {
    if grid.state_at(at) != Some(CellState::ReadyToHarvest) || unit.load >= params.capacity {
        return Ok(Effect::Rejected {
            action: Action::Harvest,
        });
    }
    grid.set_state(at, CellState::Harvested)?;
    let room = params.capacity.saturating_sub(unit.load);
    let amount = params.harvest_amount.min(room);
    unit.load = unit.load.saturating_add(amount);
    Ok(Effect::Harvested { at, amount })
}

const fn unload(unit: &mut Unit) -> Effect {
    let amount = unit.load;
    unit.load = 0;
    Effect::Unloaded { amount }
}

fn refuel(unit: &mut Unit, params: &UnitParams) -> Effect {
    let amount = params.max_fuel.saturating_sub(unit.fuel);
    unit.fuel = params.max_fuel;
    Effect::Refueled { amount }
}
