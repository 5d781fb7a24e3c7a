#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player interaction state machine that turns intents into command batches.
//!
//! The system owns the action mode and the selected-unit handle. Every intent
//! is validated against live battlefield queries before any command is
//! emitted, so the batches it produces are expected to apply cleanly; the
//! battlefield still re-validates authoritatively.

use skirmish_core::{
    ActionMode, Command, Faction, GridPos, HighlightKind, PlayerIntent, TurnPhase, UnitId,
    UnitSnapshot,
};
use skirmish_world::{query, Battlefield};

/// Player-facing per-turn interaction state machine.
///
/// The selection is a handle into the roster, never a reference; it is
/// re-validated against the live unit view on every intent and dropped the
/// moment it would refer to a dead or already-acted unit.
#[derive(Debug, Default)]
pub struct PlayerActions {
    mode: ActionMode,
    selected: Option<UnitId>,
}

impl PlayerActions {
    /// Creates a new controller with no selection and no active mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interaction mode the controller is currently committed to.
    #[must_use]
    pub fn mode(&self) -> ActionMode {
        self.mode
    }

    /// Handle of the currently selected unit, if any.
    #[must_use]
    pub fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    /// Consumes one player intent and emits the resulting command batch.
    ///
    /// Intents arriving outside the player turn are dropped wholesale.
    pub fn handle(
        &mut self,
        intent: PlayerIntent,
        battlefield: &Battlefield,
        out: &mut Vec<Command>,
    ) {
        if query::turn_phase(battlefield) != TurnPhase::PlayerTurn {
            return;
        }
        self.revalidate_selection(battlefield);

        match intent {
            PlayerIntent::SelectAt(position) => self.select_at(position, battlefield, out),
            PlayerIntent::Select(unit) => self.select_unit(unit, battlefield, out),
            PlayerIntent::EnterMoveMode => self.toggle_move_mode(battlefield, out),
            PlayerIntent::EnterAttackMode => self.toggle_attack_mode(battlefield, out),
            PlayerIntent::CommitMove(position) => self.commit_move(position, battlefield, out),
            PlayerIntent::CommitAttack(position) => self.commit_attack(position, battlefield, out),
            PlayerIntent::UseItem => self.use_item(battlefield, out),
            PlayerIntent::Wait => self.wait(battlefield, out),
            PlayerIntent::EndTurn => self.end_turn(out),
        }
    }

    /// Reports which player actions are currently legal.
    ///
    /// The snapshot is derived from live state on every call; nothing is
    /// cached between intents.
    #[must_use]
    pub fn affordances(&self, battlefield: &Battlefield) -> Affordances {
        let has_selection = self
            .selected
            .and_then(|id| query::unit_view(battlefield).unit(id).cloned())
            .map_or(false, |snapshot| snapshot.alive && !snapshot.has_acted);
        Affordances {
            move_enabled: has_selection,
            attack_enabled: has_selection,
            item_enabled: has_selection && query::healing_potions(battlefield) > 0,
            wait_enabled: has_selection,
            end_turn_enabled: query::turn_phase(battlefield) == TurnPhase::PlayerTurn,
        }
    }

    fn revalidate_selection(&mut self, battlefield: &Battlefield) {
        let Some(id) = self.selected else {
            return;
        };
        let valid = query::unit_view(battlefield)
            .unit(id)
            .map_or(false, |snapshot| {
                snapshot.faction == Faction::Ally && snapshot.alive && !snapshot.has_acted
            });
        if !valid {
            self.selected = None;
            self.mode = ActionMode::Idle;
        }
    }

    fn selection_snapshot(&self, battlefield: &Battlefield) -> Option<UnitSnapshot> {
        let id = self.selected?;
        query::unit_view(battlefield).unit(id).cloned()
    }

    fn select_at(&mut self, position: GridPos, battlefield: &Battlefield, out: &mut Vec<Command>) {
        if self.mode != ActionMode::Idle {
            return;
        }
        let Some(snapshot) = query::unit_at(battlefield, position) else {
            return;
        };
        self.take_selection(snapshot, out);
    }

    fn select_unit(&mut self, unit: UnitId, battlefield: &Battlefield, out: &mut Vec<Command>) {
        if self.mode != ActionMode::Idle {
            return;
        }
        let Some(snapshot) = query::unit_view(battlefield).unit(unit).cloned() else {
            return;
        };
        self.take_selection(snapshot, out);
    }

    fn take_selection(&mut self, snapshot: UnitSnapshot, out: &mut Vec<Command>) {
        if snapshot.faction != Faction::Ally || !snapshot.alive || snapshot.has_acted {
            return;
        }
        self.selected = Some(snapshot.id);
        out.push(Command::ClearHighlights);
        out.push(Command::SetHighlight {
            position: snapshot.position,
            kind: HighlightKind::Selected,
        });
    }

    fn toggle_move_mode(&mut self, battlefield: &Battlefield, out: &mut Vec<Command>) {
        let Some(snapshot) = self.selection_snapshot(battlefield) else {
            return;
        };
        if self.mode == ActionMode::Move {
            self.exit_mode(out);
            return;
        }
        self.mode = ActionMode::Move;
        out.push(Command::ClearHighlights);
        for position in query::valid_move_positions(
            battlefield,
            snapshot.position,
            snapshot.stats.move_range,
        ) {
            out.push(Command::SetHighlight {
                position,
                kind: HighlightKind::MoveTarget,
            });
        }
    }

    fn toggle_attack_mode(&mut self, battlefield: &Battlefield, out: &mut Vec<Command>) {
        let Some(snapshot) = self.selection_snapshot(battlefield) else {
            return;
        };
        if self.mode == ActionMode::Attack {
            self.exit_mode(out);
            return;
        }
        self.mode = ActionMode::Attack;
        out.push(Command::ClearHighlights);
        let view = query::unit_view(battlefield);
        for enemy in view.alive_in(Faction::Enemy) {
            if snapshot.can_attack(enemy) {
                out.push(Command::SetHighlight {
                    position: enemy.position,
                    kind: HighlightKind::AttackTarget,
                });
            }
        }
    }

    fn commit_move(&mut self, position: GridPos, battlefield: &Battlefield, out: &mut Vec<Command>) {
        if self.mode != ActionMode::Move {
            return;
        }
        if let Some(snapshot) = self.selection_snapshot(battlefield) {
            let distance = snapshot.position.manhattan_distance(position);
            let occupancy = query::occupancy_view(battlefield);
            if distance > 0
                && distance <= snapshot.stats.move_range
                && occupancy.is_free(position)
            {
                out.push(Command::Move {
                    unit: snapshot.id,
                    to: position,
                });
                self.selected = None;
            }
        }
        // A failed commit aborts the mode without spending the action; the
        // selection survives so the player can try something else.
        self.exit_mode(out);
    }

    fn commit_attack(
        &mut self,
        position: GridPos,
        battlefield: &Battlefield,
        out: &mut Vec<Command>,
    ) {
        if self.mode != ActionMode::Attack {
            return;
        }
        if let Some(snapshot) = self.selection_snapshot(battlefield) {
            let target = query::unit_at(battlefield, position);
            if let Some(target) = target {
                if target.faction == Faction::Enemy && snapshot.can_attack(&target) {
                    out.push(Command::Strike {
                        attacker: snapshot.id,
                        target: position,
                    });
                    self.selected = None;
                }
            }
        }
        self.exit_mode(out);
    }

    fn use_item(&mut self, battlefield: &Battlefield, out: &mut Vec<Command>) {
        let Some(snapshot) = self.selection_snapshot(battlefield) else {
            return;
        };
        if query::healing_potions(battlefield) == 0 {
            return;
        }
        out.push(Command::UsePotion { unit: snapshot.id });
        self.selected = None;
        self.exit_mode(out);
    }

    fn wait(&mut self, battlefield: &Battlefield, out: &mut Vec<Command>) {
        let Some(snapshot) = self.selection_snapshot(battlefield) else {
            return;
        };
        out.push(Command::Hold { unit: snapshot.id });
        self.selected = None;
        self.exit_mode(out);
    }

    fn end_turn(&mut self, out: &mut Vec<Command>) {
        self.selected = None;
        self.exit_mode(out);
        out.push(Command::EndPlayerTurn);
    }

    fn exit_mode(&mut self, out: &mut Vec<Command>) {
        self.mode = ActionMode::Idle;
        out.push(Command::ClearHighlights);
    }
}

/// Derived snapshot of which player actions are currently legal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Affordances {
    /// Move mode can be entered.
    pub move_enabled: bool,
    /// Attack mode can be entered.
    pub attack_enabled: bool,
    /// A healing potion can be used.
    pub item_enabled: bool,
    /// The selection can hold position.
    pub wait_enabled: bool,
    /// The turn can be handed to the enemy faction.
    pub end_turn_enabled: bool,
}
