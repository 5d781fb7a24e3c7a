#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battlefield state management for Skirmish.
//!
//! The battlefield owns the unit roster, the dense occupancy grid, the
//! presentation highlight layer, the turn sequencing state machine, and the
//! shared potion pool. All mutation flows through [`apply`]; collaborators
//! observe the results through broadcast [`Event`] values and the pure reads
//! in [`query`].

use skirmish_core::{
    ActionError, Command, DeployError, Event, Faction, GridPos, HighlightKind, Outcome, TurnPhase,
    UnitId, UnitSpec, UnitStats,
};

const DEFAULT_GRID_WIDTH: i32 = 8;
const DEFAULT_GRID_HEIGHT: i32 = 8;
const DEFAULT_HEALING_POTIONS: u32 = 1;

/// Hit points restored by one healing potion.
pub const POTION_RESTORE: u32 = 10;

/// Encounter parameters fixed at battlefield construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BattleConfig {
    /// Number of grid columns.
    pub width: i32,
    /// Number of grid rows.
    pub height: i32,
    /// Healing potions available to the player faction for the encounter.
    pub healing_potions: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            healing_potions: DEFAULT_HEALING_POTIONS,
        }
    }
}

/// Represents the authoritative Skirmish battlefield state.
#[derive(Debug)]
pub struct Battlefield {
    units: Vec<UnitState>,
    occupancy: OccupancyGrid,
    highlights: HighlightGrid,
    phase: TurnPhase,
    turn_count: u32,
    potions: u32,
    started: bool,
}

impl Battlefield {
    /// Creates a battlefield with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BattleConfig::default())
    }

    /// Creates a battlefield from an explicit configuration.
    ///
    /// Negative dimensions collapse to an empty grid rather than wrapping.
    #[must_use]
    pub fn with_config(config: BattleConfig) -> Self {
        let width = config.width.max(0);
        let height = config.height.max(0);
        Self {
            units: Vec::new(),
            occupancy: OccupancyGrid::new(width, height),
            highlights: HighlightGrid::new(width, height),
            phase: TurnPhase::PlayerTurn,
            turn_count: 0,
            potions: config.healing_potions,
            started: false,
        }
    }

    fn unit_index(&self, unit: UnitId) -> Option<usize> {
        self.units.iter().position(|state| state.id == unit)
    }

    fn alive_count(&self, faction: Faction) -> usize {
        self.units
            .iter()
            .filter(|state| state.faction == faction && state.is_alive())
            .count()
    }

    fn reset_faction_actions(&mut self, faction: Faction) {
        for state in &mut self.units {
            if state.faction == faction && state.is_alive() {
                state.has_acted = false;
            }
        }
    }

    fn validate_actor(&self, unit: UnitId) -> Result<usize, ActionError> {
        let index = self.unit_index(unit).ok_or(ActionError::UnknownUnit)?;
        let state = &self.units[index];
        if !state.is_alive() {
            return Err(ActionError::UnitDead);
        }
        if !self.started || self.phase.acting_faction() != Some(state.faction) {
            return Err(ActionError::WrongPhase);
        }
        if state.has_acted {
            return Err(ActionError::AlreadyActed);
        }
        Ok(index)
    }

    fn deploy(&mut self, spec: UnitSpec, out_events: &mut Vec<Event>) {
        let reason = if self.started {
            Some(DeployError::EncounterUnderway)
        } else if !self.occupancy.in_bounds(spec.position) {
            Some(DeployError::OutOfBounds)
        } else if self.occupancy.occupant(spec.position).is_some() {
            Some(DeployError::Occupied)
        } else {
            None
        };

        if let Some(reason) = reason {
            out_events.push(Event::DeployRejected {
                position: spec.position,
                reason,
            });
            return;
        }

        let id = UnitId::new(self.units.len() as u32);
        self.occupancy.occupy(id, spec.position);
        self.units.push(UnitState::from_spec(id, spec));

        let state = &self.units[self.units.len() - 1];
        out_events.push(Event::UnitDeployed {
            unit: id,
            faction: state.faction,
            position: state.position,
        });
    }

    fn start_encounter(&mut self, out_events: &mut Vec<Event>) {
        if self.started {
            return;
        }
        self.started = true;
        self.phase = TurnPhase::PlayerTurn;
        self.turn_count = 1;
        self.reset_faction_actions(Faction::Ally);
        out_events.push(Event::PlayerTurnStarted { turn: 1 });
        self.evaluate_outcome(out_events);
    }

    fn move_unit(&mut self, unit: UnitId, to: GridPos, out_events: &mut Vec<Event>) {
        let index = match self.validate_actor(unit) {
            Ok(index) => index,
            Err(reason) => {
                out_events.push(Event::MoveRejected { unit, to, reason });
                return;
            }
        };

        let from = self.units[index].position;
        let distance = from.manhattan_distance(to);
        let reason = if !self.occupancy.in_bounds(to) {
            Some(ActionError::OutOfBounds)
        } else if distance == 0 || distance > self.units[index].stats.move_range {
            Some(ActionError::OutOfRange)
        } else if self.occupancy.occupant(to).is_some() {
            Some(ActionError::DestinationOccupied)
        } else {
            None
        };

        if let Some(reason) = reason {
            out_events.push(Event::MoveRejected { unit, to, reason });
            return;
        }

        self.occupancy.vacate(from);
        self.occupancy.occupy(unit, to);
        let state = &mut self.units[index];
        state.position = to;
        state.has_acted = true;
        out_events.push(Event::UnitMoved { unit, from, to });
    }

    fn strike(&mut self, attacker: UnitId, target: GridPos, out_events: &mut Vec<Event>) {
        let reject = |reason, out_events: &mut Vec<Event>| {
            out_events.push(Event::StrikeRejected {
                attacker,
                target,
                reason,
            });
        };

        let attacker_index = match self.validate_actor(attacker) {
            Ok(index) => index,
            Err(reason) => {
                reject(reason, out_events);
                return;
            }
        };

        let Some(target_id) = self.occupancy.occupant(target) else {
            reject(ActionError::NoTarget, out_events);
            return;
        };
        let Some(target_index) = self.unit_index(target_id) else {
            reject(ActionError::NoTarget, out_events);
            return;
        };

        if self.units[target_index].faction != self.units[attacker_index].faction.opponent() {
            reject(ActionError::FriendlyFire, out_events);
            return;
        }

        let attacker_stats = self.units[attacker_index].stats;
        let attacker_position = self.units[attacker_index].position;
        let target_position = self.units[target_index].position;
        if attacker_position.manhattan_distance(target_position) > attacker_stats.attack_range {
            reject(ActionError::OutOfRange, out_events);
            return;
        }

        let damage = attacker_stats.damage_against(self.units[target_index].stats.defense);
        let state = &mut self.units[target_index];
        state.hp = state.hp.saturating_sub(damage);
        let remaining_hp = state.hp;
        out_events.push(Event::UnitStruck {
            attacker,
            target: target_id,
            damage,
            remaining_hp,
        });

        if remaining_hp == 0 {
            // Marking dead and vacating the cell happen in the same command
            // application; occupancy never references a dead unit.
            state.alive = false;
            self.occupancy.vacate(target_position);
            out_events.push(Event::UnitDied {
                unit: target_id,
                position: target_position,
            });
        }

        self.units[attacker_index].has_acted = true;
        self.evaluate_outcome(out_events);
    }

    fn use_potion(&mut self, unit: UnitId, out_events: &mut Vec<Event>) {
        let validated = self.validate_actor(unit).and_then(|index| {
            if self.units[index].faction != Faction::Ally {
                // The potion pool belongs to the player faction.
                Err(ActionError::WrongPhase)
            } else if self.potions == 0 {
                Err(ActionError::NoPotions)
            } else {
                Ok(index)
            }
        });

        let index = match validated {
            Ok(index) => index,
            Err(reason) => {
                out_events.push(Event::PotionRejected { unit, reason });
                return;
            }
        };

        let state = &mut self.units[index];
        let before = state.hp;
        state.hp = state.hp.saturating_add(POTION_RESTORE).min(state.stats.max_hp);
        let hp = state.hp;
        state.has_acted = true;
        self.potions -= 1;
        out_events.push(Event::PotionUsed {
            unit,
            restored: hp - before,
            hp,
            potions_left: self.potions,
        });
    }

    fn hold(&mut self, unit: UnitId, out_events: &mut Vec<Event>) {
        let index = match self.validate_actor(unit) {
            Ok(index) => index,
            Err(reason) => {
                out_events.push(Event::HoldRejected { unit, reason });
                return;
            }
        };
        self.units[index].has_acted = true;
        out_events.push(Event::UnitHeld { unit });
    }

    fn end_player_turn(&mut self, out_events: &mut Vec<Event>) {
        if !self.started || self.phase != TurnPhase::PlayerTurn {
            return;
        }
        self.phase = TurnPhase::EnemyTurn;
        self.reset_faction_actions(Faction::Enemy);
        out_events.push(Event::EnemyTurnStarted {
            turn: self.turn_count,
        });
    }

    fn finish_enemy_turn(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != TurnPhase::EnemyTurn {
            return;
        }
        self.turn_count = self.turn_count.saturating_add(1);
        self.phase = TurnPhase::PlayerTurn;
        self.reset_faction_actions(Faction::Ally);
        out_events.push(Event::PlayerTurnStarted {
            turn: self.turn_count,
        });
        self.evaluate_outcome(out_events);
    }

    fn set_highlight(&mut self, position: GridPos, kind: HighlightKind, out_events: &mut Vec<Event>) {
        if self.highlights.set(position, kind) {
            out_events.push(Event::CellHighlighted { position, kind });
        }
    }

    fn clear_highlights(&mut self, out_events: &mut Vec<Event>) {
        self.highlights.clear_all();
        out_events.push(Event::HighlightsCleared);
    }

    /// Decides the encounter the instant either roster has no living units.
    ///
    /// Enemy emptiness is checked first and ally emptiness second, the later
    /// check overwriting the earlier, so a simultaneous double elimination
    /// reports defeat. The terminal-phase guard makes the result event fire
    /// exactly once.
    fn evaluate_outcome(&mut self, out_events: &mut Vec<Event>) {
        if !self.started || self.phase.is_terminal() {
            return;
        }
        let mut decided = None;
        if self.alive_count(Faction::Enemy) == 0 {
            decided = Some(Outcome::Victory);
        }
        if self.alive_count(Faction::Ally) == 0 {
            decided = Some(Outcome::Defeat);
        }
        let Some(outcome) = decided else {
            return;
        };
        self.phase = match outcome {
            Outcome::Victory => TurnPhase::Victory,
            Outcome::Defeat => TurnPhase::Defeat,
        };
        out_events.push(Event::EncounterEnded {
            outcome,
            turn: self.turn_count,
        });
    }

    fn occupancy_consistent(&self) -> bool {
        let cells_match = self.occupancy.cells().iter().enumerate().all(|(index, cell)| {
            cell.map_or(true, |id| {
                self.units.iter().any(|state| {
                    state.id == id
                        && state.is_alive()
                        && self.occupancy.index(state.position) == Some(index)
                })
            })
        });
        let units_mapped = self.units.iter().all(|state| {
            !state.is_alive()
                || !self.occupancy.in_bounds(state.position)
                || self.occupancy.occupant(state.position) == Some(state.id)
        });
        cells_match && units_mapped
    }
}

impl Default for Battlefield {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the battlefield, mutating state
/// deterministically and appending broadcast events to `out_events`.
pub fn apply(battlefield: &mut Battlefield, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Deploy { spec } => battlefield.deploy(spec, out_events),
        Command::StartEncounter => battlefield.start_encounter(out_events),
        Command::Move { unit, to } => battlefield.move_unit(unit, to, out_events),
        Command::Strike { attacker, target } => battlefield.strike(attacker, target, out_events),
        Command::UsePotion { unit } => battlefield.use_potion(unit, out_events),
        Command::Hold { unit } => battlefield.hold(unit, out_events),
        Command::EndPlayerTurn => battlefield.end_player_turn(out_events),
        Command::FinishEnemyTurn => battlefield.finish_enemy_turn(out_events),
        Command::SetHighlight { position, kind } => {
            battlefield.set_highlight(position, kind, out_events);
        }
        Command::ClearHighlights => battlefield.clear_highlights(out_events),
    }
    debug_assert!(
        battlefield.occupancy_consistent(),
        "occupancy diverged from the unit roster"
    );
}

/// Query functions that provide read-only access to the battlefield state.
pub mod query {
    use super::Battlefield;
    use skirmish_core::{
        Faction, GridPos, HighlightView, OccupancyView, TurnPhase, UnitSnapshot, UnitView,
    };

    /// Current phase of the turn sequencing state machine.
    #[must_use]
    pub fn turn_phase(battlefield: &Battlefield) -> TurnPhase {
        battlefield.phase
    }

    /// One-based turn counter; increments when an enemy turn completes.
    #[must_use]
    pub fn turn_count(battlefield: &Battlefield) -> u32 {
        battlefield.turn_count
    }

    /// Healing potions remaining in the player faction's shared pool.
    #[must_use]
    pub fn healing_potions(battlefield: &Battlefield) -> u32 {
        battlefield.potions
    }

    /// Grid dimensions as (width, height).
    #[must_use]
    pub fn dimensions(battlefield: &Battlefield) -> (i32, i32) {
        battlefield.occupancy.dimensions()
    }

    /// Captures a read-only view of the full roster, dead units included.
    #[must_use]
    pub fn unit_view(battlefield: &Battlefield) -> UnitView {
        UnitView::from_snapshots(
            battlefield
                .units
                .iter()
                .map(super::UnitState::snapshot)
                .collect(),
        )
    }

    /// Snapshots of the living members of one faction, in roster order.
    #[must_use]
    pub fn alive_units(battlefield: &Battlefield, faction: Faction) -> Vec<UnitSnapshot> {
        battlefield
            .units
            .iter()
            .filter(|state| state.faction == faction && state.is_alive())
            .map(super::UnitState::snapshot)
            .collect()
    }

    /// Snapshot of the living unit occupying the provided cell, if any.
    #[must_use]
    pub fn unit_at(battlefield: &Battlefield, position: GridPos) -> Option<UnitSnapshot> {
        let id = battlefield.occupancy.occupant(position)?;
        battlefield
            .units
            .iter()
            .find(|state| state.id == id)
            .map(super::UnitState::snapshot)
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(battlefield: &Battlefield) -> OccupancyView<'_> {
        let (width, height) = battlefield.occupancy.dimensions();
        OccupancyView::new(battlefield.occupancy.cells(), width, height)
    }

    /// Exposes a read-only view of the presentation highlight layer.
    #[must_use]
    pub fn highlight_view(battlefield: &Battlefield) -> HighlightView<'_> {
        let (width, height) = battlefield.occupancy.dimensions();
        HighlightView::new(battlefield.highlights.cells(), width, height)
    }

    /// Enumerates every unoccupied cell within walking range of `origin`.
    ///
    /// A cell qualifies when `0 < manhattan(origin, cell) <= range`; the
    /// origin itself never qualifies.
    #[must_use]
    pub fn valid_move_positions(
        battlefield: &Battlefield,
        origin: GridPos,
        range: u32,
    ) -> Vec<GridPos> {
        let (width, height) = battlefield.occupancy.dimensions();
        let mut positions = Vec::new();
        for x in 0..width {
            for y in 0..height {
                let candidate = GridPos::new(x, y);
                let distance = origin.manhattan_distance(candidate);
                if distance > 0
                    && distance <= range
                    && battlefield.occupancy.occupant(candidate).is_none()
                {
                    positions.push(candidate);
                }
            }
        }
        positions
    }
}

#[derive(Clone, Debug)]
struct UnitState {
    id: UnitId,
    name: String,
    faction: Faction,
    stats: UnitStats,
    hp: u32,
    position: GridPos,
    has_acted: bool,
    alive: bool,
}

impl UnitState {
    fn from_spec(id: UnitId, spec: UnitSpec) -> Self {
        Self {
            id,
            name: spec.name,
            faction: spec.faction,
            stats: spec.stats,
            hp: spec.stats.max_hp,
            position: spec.position,
            has_acted: false,
            alive: true,
        }
    }

    fn is_alive(&self) -> bool {
        self.alive && self.hp > 0
    }

    fn snapshot(&self) -> skirmish_core::UnitSnapshot {
        skirmish_core::UnitSnapshot {
            id: self.id,
            name: self.name.clone(),
            faction: self.faction,
            position: self.position,
            hp: self.hp,
            stats: self.stats,
            has_acted: self.has_acted,
            alive: self.is_alive(),
        }
    }
}

#[derive(Clone, Debug)]
struct OccupancyGrid {
    width: i32,
    height: i32,
    cells: Vec<Option<UnitId>>,
}

impl OccupancyGrid {
    fn new(width: i32, height: i32) -> Self {
        let capacity = usize::try_from(width).unwrap_or(0) * usize::try_from(height).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![None; capacity],
        }
    }

    fn in_bounds(&self, position: GridPos) -> bool {
        position.x() >= 0
            && position.x() < self.width
            && position.y() >= 0
            && position.y() < self.height
    }

    fn occupant(&self, position: GridPos) -> Option<UnitId> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn occupy(&mut self, unit: UnitId, position: GridPos) {
        if let Some(index) = self.index(position) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(unit);
            }
        }
    }

    fn vacate(&mut self, position: GridPos) {
        if let Some(index) = self.index(position) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = None;
            }
        }
    }

    fn index(&self, position: GridPos) -> Option<usize> {
        if !self.in_bounds(position) {
            return None;
        }
        let row = usize::try_from(position.y()).ok()?;
        let column = usize::try_from(position.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }

    fn cells(&self) -> &[Option<UnitId>] {
        &self.cells
    }

    fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }
}

#[derive(Clone, Debug)]
struct HighlightGrid {
    width: i32,
    height: i32,
    cells: Vec<HighlightKind>,
}

impl HighlightGrid {
    fn new(width: i32, height: i32) -> Self {
        let capacity = usize::try_from(width).unwrap_or(0) * usize::try_from(height).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![HighlightKind::None; capacity],
        }
    }

    fn set(&mut self, position: GridPos, kind: HighlightKind) -> bool {
        let Some(index) = self.index(position) else {
            return false;
        };
        match self.cells.get_mut(index) {
            Some(slot) => {
                *slot = kind;
                true
            }
            None => false,
        }
    }

    fn clear_all(&mut self) {
        self.cells.fill(HighlightKind::None);
    }

    fn index(&self, position: GridPos) -> Option<usize> {
        if position.x() < 0
            || position.x() >= self.width
            || position.y() < 0
            || position.y() >= self.height
        {
            return None;
        }
        let row = usize::try_from(position.y()).ok()?;
        let column = usize::try_from(position.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }

    fn cells(&self) -> &[HighlightKind] {
        &self.cells
    }
}
