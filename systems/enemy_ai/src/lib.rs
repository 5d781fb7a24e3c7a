#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scripted enemy decision procedure processed one unit per step.
//!
//! The planner captures the living enemy roster when the enemy turn begins
//! and resolves exactly one enemy per [`EnemyPlanner::step`] call, emitting
//! command batches for the battlefield to apply. Pacing between steps is the
//! caller's concern; running the steps back to back produces identical
//! outcomes.

use std::collections::VecDeque;

use skirmish_core::{
    Command, Direction, Faction, GridPos, OccupancyView, TurnPhase, UnitId, UnitSnapshot, UnitView,
};
use skirmish_world::{query, Battlefield};

/// Sequential enemy-turn planner backed by an explicit step queue.
#[derive(Debug, Default)]
pub struct EnemyPlanner {
    queue: VecDeque<UnitId>,
    active: bool,
}

/// Result of resolving one planner step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The named enemy resolved its action this step.
    Acted(UnitId),
    /// Every queued enemy has acted and turn completion was signalled.
    TurnComplete,
    /// No enemy turn is in progress.
    Idle,
}

impl EnemyPlanner {
    /// Creates a planner with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the living enemy roster, in roster order, for this turn.
    ///
    /// Calling this outside the enemy phase leaves the planner idle.
    pub fn begin_turn(&mut self, battlefield: &Battlefield) {
        self.queue.clear();
        self.active = query::turn_phase(battlefield) == TurnPhase::EnemyTurn;
        if !self.active {
            return;
        }
        for enemy in query::unit_view(battlefield).alive_in(Faction::Enemy) {
            self.queue.push_back(enemy.id);
        }
    }

    /// Resolves the next queued enemy and emits its commands.
    ///
    /// Enemies that died or acted since the roster was captured are skipped.
    /// Once the queue drains, [`Command::FinishEnemyTurn`] is emitted and the
    /// planner goes idle; the same happens immediately when the encounter was
    /// decided mid-turn.
    pub fn step(&mut self, battlefield: &Battlefield, out: &mut Vec<Command>) -> StepOutcome {
        if !self.active {
            return StepOutcome::Idle;
        }
        if query::turn_phase(battlefield) != TurnPhase::EnemyTurn {
            self.queue.clear();
            self.active = false;
            return StepOutcome::TurnComplete;
        }

        let view = query::unit_view(battlefield);
        while let Some(id) = self.queue.pop_front() {
            let Some(snapshot) = view.unit(id) else {
                continue;
            };
            if !snapshot.alive || snapshot.has_acted {
                continue;
            }
            plan_action(snapshot, &view, query::occupancy_view(battlefield), out);
            return StepOutcome::Acted(id);
        }

        self.active = false;
        out.push(Command::FinishEnemyTurn);
        StepOutcome::TurnComplete
    }
}

/// Emits the single command that resolves one enemy's action.
fn plan_action(
    enemy: &UnitSnapshot,
    view: &UnitView,
    occupancy: OccupancyView<'_>,
    out: &mut Vec<Command>,
) {
    let Some(target) = nearest_ally(enemy, view) else {
        // Nothing left to fight; the unit still spends its action.
        out.push(Command::Hold { unit: enemy.id });
        return;
    };

    if enemy.can_attack(target) {
        out.push(Command::Strike {
            attacker: enemy.id,
            target: target.position,
        });
        return;
    }

    match best_step_toward(enemy.position, target.position, occupancy) {
        Some(destination) => out.push(Command::Move {
            unit: enemy.id,
            to: destination,
        }),
        None => out.push(Command::Hold { unit: enemy.id }),
    }
}

/// Nearest living ally by Manhattan distance; roster order breaks ties.
fn nearest_ally<'a>(enemy: &UnitSnapshot, view: &'a UnitView) -> Option<&'a UnitSnapshot> {
    let mut nearest: Option<(&UnitSnapshot, u32)> = None;
    for ally in view.alive_in(Faction::Ally) {
        let distance = enemy.distance_to(ally.position);
        let closer = nearest.map_or(true, |(_, best)| distance < best);
        if closer {
            nearest = Some((ally, distance));
        }
    }
    nearest.map(|(ally, _)| ally)
}

/// Best single-step destination that strictly closes on the target.
///
/// Candidates are scanned in the fixed Up, Down, Right, Left order; each
/// must be in bounds, unoccupied, and closer than the running best, which
/// starts at the current distance. No improvement means no move.
fn best_step_toward(
    origin: GridPos,
    target: GridPos,
    occupancy: OccupancyView<'_>,
) -> Option<GridPos> {
    let mut best_distance = origin.manhattan_distance(target);
    let mut best_move = None;
    for direction in Direction::ALL {
        let candidate = origin.step(direction);
        if !occupancy.is_free(candidate) {
            continue;
        }
        let distance = candidate.manhattan_distance(target);
        if distance < best_distance {
            best_distance = distance;
            best_move = Some(candidate);
        }
    }
    best_move
}
