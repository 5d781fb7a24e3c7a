#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skirmish engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative battlefield, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the battlefield executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values for collaborators to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with
//! new command batches.

use serde::{Deserialize, Serialize};

/// Side of the encounter a unit fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Player-controlled side.
    Ally,
    /// Opposition side driven by the scripted decision procedure.
    Enemy,
}

impl Faction {
    /// Returns the opposing faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Ally => Self::Enemy,
            Self::Enemy => Self::Ally,
        }
    }
}

/// Phase of the turn sequencing state machine.
///
/// `Victory` and `Defeat` are terminal: once entered, no further phase
/// transitions occur and end-turn commands are absorbed silently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    /// The player faction is acting.
    PlayerTurn,
    /// The enemy decision procedure is acting.
    EnemyTurn,
    /// All enemies are dead; the encounter is decided for the player.
    Victory,
    /// All allies are dead; the encounter is decided against the player.
    Defeat,
}

impl TurnPhase {
    /// Reports whether the phase admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }

    /// Faction allowed to act during this phase, if any.
    #[must_use]
    pub const fn acting_faction(self) -> Option<Faction> {
        match self {
            Self::PlayerTurn => Some(Faction::Ally),
            Self::EnemyTurn => Some(Faction::Enemy),
            Self::Victory | Self::Defeat => None,
        }
    }
}

/// Decided result of an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The enemy faction was eliminated.
    Victory,
    /// The ally faction was eliminated.
    Defeat,
}

/// Interaction intent the player is currently committed to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActionMode {
    /// No pending interaction beyond selection.
    #[default]
    Idle,
    /// A destination click commits a move for the selected unit.
    Move,
    /// A target click commits a strike for the selected unit.
    Attack,
}

/// Presentation marker attached to a grid cell.
///
/// The engine records which cells are emphasised; mapping a kind to an
/// actual colour or effect is entirely an adapter concern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    /// No emphasis.
    #[default]
    None,
    /// Cell of the currently selected unit.
    Selected,
    /// Legal destination while move mode is active.
    MoveTarget,
    /// Reachable enemy while attack mode is active.
    AttackTarget,
}

/// Unique identifier assigned to a unit.
///
/// Identifiers are allocated in deployment order, so ordering by id
/// reproduces the roster enumeration order used for targeting tie-breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as signed x and y coordinates.
///
/// Coordinates are signed so off-board step candidates are representable;
/// bounds checks reject them instead of the arithmetic wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    x: i32,
    y: i32,
}

impl GridPos {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Returns the neighbouring position one step in the given direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Cardinal single-step directions available to advancing units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward increasing y.
    Up,
    /// Movement toward decreasing y.
    Down,
    /// Movement toward increasing x.
    Right,
    /// Movement toward decreasing x.
    Left,
}

impl Direction {
    /// Candidate scan order used by the enemy decision procedure.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Right, Self::Left];

    /// Coordinate offset applied by one step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Right => (1, 0),
            Self::Left => (-1, 0),
        }
    }
}

/// Combat statistics shared by every unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points; healing clamps to this value.
    pub max_hp: u32,
    /// Raw attack power before the defender's defense applies.
    pub attack: u32,
    /// Flat damage reduction applied to incoming strikes.
    pub defense: u32,
    /// Maximum Manhattan distance covered by one move action.
    pub move_range: u32,
    /// Maximum Manhattan distance at which strikes connect.
    pub attack_range: u32,
}

impl UnitStats {
    /// Damage dealt by this unit's strike against the given defense.
    ///
    /// A strike always deals at least 1 damage regardless of how high the
    /// defense is; there is no miss chance.
    #[must_use]
    pub fn damage_against(&self, defense: u32) -> u32 {
        self.attack.saturating_sub(defense).max(1)
    }
}

/// Roster entry supplied by the encounter setup collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Display name surfaced in snapshots and adapter output.
    pub name: String,
    /// Side the unit fights for.
    pub faction: Faction,
    /// Combat statistics; the unit starts at full hit points.
    pub stats: UnitStats,
    /// Starting cell on the battlefield.
    pub position: GridPos,
}

/// Commands that express all permissible battlefield mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Adds a unit to the roster before the encounter starts.
    Deploy {
        /// Description of the unit to place.
        spec: UnitSpec,
    },
    /// Locks the roster and begins the first player turn.
    StartEncounter,
    /// Relocates a unit to an unoccupied cell within its move range.
    Move {
        /// Unit attempting the move.
        unit: UnitId,
        /// Destination cell.
        to: GridPos,
    },
    /// Strikes the unit occupying the target cell.
    Strike {
        /// Unit delivering the strike.
        attacker: UnitId,
        /// Cell the strike is aimed at.
        target: GridPos,
    },
    /// Consumes a healing potion to restore the unit's hit points.
    UsePotion {
        /// Unit drinking the potion.
        unit: UnitId,
    },
    /// Spends the unit's action without any board effect.
    Hold {
        /// Unit standing down for the turn.
        unit: UnitId,
    },
    /// Ends the player turn and hands control to the enemy faction.
    EndPlayerTurn,
    /// Reports that every enemy has acted, returning control to the player.
    FinishEnemyTurn,
    /// Marks a cell with a presentation highlight.
    SetHighlight {
        /// Cell to emphasise.
        position: GridPos,
        /// Kind of emphasis to record.
        kind: HighlightKind,
    },
    /// Resets every cell's highlight to [`HighlightKind::None`].
    ClearHighlights,
}

/// Events broadcast by the battlefield after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a unit joined the roster.
    UnitDeployed {
        /// Identifier assigned to the new unit.
        unit: UnitId,
        /// Side the unit fights for.
        faction: Faction,
        /// Cell the unit occupies after deployment.
        position: GridPos,
    },
    /// Reports that a deployment request was rejected.
    DeployRejected {
        /// Cell provided in the deployment request.
        position: GridPos,
        /// Specific reason the deployment failed.
        reason: DeployError,
    },
    /// Announces that a player turn began.
    PlayerTurnStarted {
        /// One-based turn counter.
        turn: u32,
    },
    /// Announces that an enemy turn began.
    EnemyTurnStarted {
        /// One-based turn counter.
        turn: u32,
    },
    /// Confirms that a unit moved between two cells.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Cell the unit occupied before moving.
        from: GridPos,
        /// Cell the unit occupies after the move.
        to: GridPos,
    },
    /// Reports that a move request was rejected.
    MoveRejected {
        /// Unit that attempted the move.
        unit: UnitId,
        /// Destination provided in the request.
        to: GridPos,
        /// Specific reason the move failed.
        reason: ActionError,
    },
    /// Confirms that a strike connected.
    UnitStruck {
        /// Unit that delivered the strike.
        attacker: UnitId,
        /// Unit that absorbed it.
        target: UnitId,
        /// Damage dealt after the defense reduction and minimum floor.
        damage: u32,
        /// Target hit points remaining after the strike.
        remaining_hp: u32,
    },
    /// Reports that a strike request was rejected.
    StrikeRejected {
        /// Unit that attempted the strike.
        attacker: UnitId,
        /// Cell the strike was aimed at.
        target: GridPos,
        /// Specific reason the strike failed.
        reason: ActionError,
    },
    /// Announces that a unit's hit points reached zero.
    UnitDied {
        /// Unit that died.
        unit: UnitId,
        /// Cell vacated by the death.
        position: GridPos,
    },
    /// Confirms that a healing potion was consumed.
    PotionUsed {
        /// Unit that drank the potion.
        unit: UnitId,
        /// Hit points actually restored after clamping.
        restored: u32,
        /// Unit hit points after the heal.
        hp: u32,
        /// Potions remaining in the shared pool.
        potions_left: u32,
    },
    /// Reports that a potion request was rejected.
    PotionRejected {
        /// Unit that attempted to drink.
        unit: UnitId,
        /// Specific reason the potion was refused.
        reason: ActionError,
    },
    /// Confirms that a unit spent its action holding position.
    UnitHeld {
        /// Unit that stood down.
        unit: UnitId,
    },
    /// Reports that a hold request was rejected.
    HoldRejected {
        /// Unit that attempted to stand down.
        unit: UnitId,
        /// Specific reason the hold failed.
        reason: ActionError,
    },
    /// Confirms that a cell's highlight changed.
    CellHighlighted {
        /// Cell that was emphasised.
        position: GridPos,
        /// Kind of emphasis recorded.
        kind: HighlightKind,
    },
    /// Confirms that every highlight was reset.
    HighlightsCleared,
    /// Announces the encounter result; emitted exactly once.
    EncounterEnded {
        /// Decided result.
        outcome: Outcome,
        /// Turn counter at the moment the encounter was decided.
        turn: u32,
    },
}

/// Reasons a deployment request may be rejected by the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeployError {
    /// The roster is locked because the encounter already started.
    EncounterUnderway,
    /// The requested cell lies outside the configured grid bounds.
    OutOfBounds,
    /// The requested cell already holds a living unit.
    Occupied,
}

/// Reasons an action command may be rejected by the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionError {
    /// No unit with the provided identifier exists.
    UnknownUnit,
    /// The acting unit is dead.
    UnitDead,
    /// The acting unit's faction is not the one whose turn it is.
    WrongPhase,
    /// The acting unit already spent its action this turn.
    AlreadyActed,
    /// The destination lies outside the configured grid bounds.
    OutOfBounds,
    /// The destination or target lies beyond the unit's range.
    OutOfRange,
    /// The destination cell already holds a living unit.
    DestinationOccupied,
    /// No living unit occupies the targeted cell.
    NoTarget,
    /// The targeted unit belongs to the attacker's own faction.
    FriendlyFire,
    /// The shared potion pool is empty.
    NoPotions,
}

/// Discrete gestures produced by an input adapter during the player turn.
///
/// Adapters resolve pointer or scripted input down to grid positions and
/// unit handles before intents reach the engine; screen coordinates never
/// cross this boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerIntent {
    /// Select the unit occupying the given cell.
    SelectAt(GridPos),
    /// Select a unit directly by handle.
    Select(UnitId),
    /// Toggle move mode for the current selection.
    EnterMoveMode,
    /// Toggle attack mode for the current selection.
    EnterAttackMode,
    /// Commit the pending move to the given destination.
    CommitMove(GridPos),
    /// Commit the pending strike against the given cell.
    CommitAttack(GridPos),
    /// Spend the selection's action on a healing potion.
    UseItem,
    /// Spend the selection's action holding position.
    Wait,
    /// End the player turn.
    EndTurn,
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Display name supplied at deployment.
    pub name: String,
    /// Side the unit fights for.
    pub faction: Faction,
    /// Cell currently recorded for the unit.
    pub position: GridPos,
    /// Current hit points.
    pub hp: u32,
    /// Combat statistics supplied at deployment.
    pub stats: UnitStats,
    /// Whether the unit already spent its action this turn.
    pub has_acted: bool,
    /// Whether the unit is alive; dead units stay in the roster inert.
    pub alive: bool,
}

impl UnitSnapshot {
    /// Manhattan distance from this unit to the given position.
    #[must_use]
    pub fn distance_to(&self, position: GridPos) -> u32 {
        self.position.manhattan_distance(position)
    }

    /// Reports whether this unit can currently strike the target.
    #[must_use]
    pub fn can_attack(&self, target: &UnitSnapshot) -> bool {
        target.alive && self.distance_to(target.position) <= self.stats.attack_range
    }
}

/// Read-only snapshot describing the full roster in deterministic order.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a single unit by handle.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Iterator over the living members of one faction, in roster order.
    pub fn alive_in(&self, faction: Faction) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.alive && snapshot.faction == faction)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<UnitId>],
    width: i32,
    height: i32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<UnitId>], width: i32, height: i32) -> Self {
        Self {
            cells,
            width,
            height,
        }
    }

    /// Returns the living unit occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, position: GridPos) -> Option<UnitId> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the cell is inside bounds and currently unoccupied.
    #[must_use]
    pub fn is_free(&self, position: GridPos) -> bool {
        self.index(position).map_or(false, |index| {
            self.cells.get(index).copied().unwrap_or(None).is_none()
        })
    }

    /// Pure bounds check against the configured grid dimensions.
    #[must_use]
    pub const fn in_bounds(&self, position: GridPos) -> bool {
        position.x() >= 0
            && position.x() < self.width
            && position.y() >= 0
            && position.y() < self.height
    }

    /// Provides the dimensions of the underlying occupancy grid.
    #[must_use]
    pub const fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
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
}

/// Read-only view into the presentation highlight layer.
#[derive(Clone, Copy, Debug)]
pub struct HighlightView<'a> {
    cells: &'a [HighlightKind],
    width: i32,
    height: i32,
}

impl<'a> HighlightView<'a> {
    /// Captures a new highlight view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [HighlightKind], width: i32, height: i32) -> Self {
        Self {
            cells,
            width,
            height,
        }
    }

    /// Returns the highlight recorded for the cell; out-of-bounds cells
    /// report [`HighlightKind::None`].
    #[must_use]
    pub fn kind_at(&self, position: GridPos) -> HighlightKind {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(HighlightKind::None)
    }

    /// Iterator over every cell's highlight in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = HighlightKind> + 'a {
        self.cells.iter().copied()
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
}
