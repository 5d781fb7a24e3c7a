//! Scenario files consumed by the command-line driver.
//!
//! A scenario bundles the encounter configuration, the starting roster, and
//! the scripted player intents that stand in for pointer input. Files are
//! plain JSON; omitted fields fall back to the defaults of the built-in demo
//! encounter.

use std::{fs, path::Path};

use serde::Deserialize;
use skirmish_core::{Faction, GridPos, PlayerIntent, UnitSpec, UnitStats};
use skirmish_world::BattleConfig;
use thiserror::Error;

const DEFAULT_DIMENSION: i32 = 8;
const DEFAULT_POTIONS: u32 = 1;

/// Errors produced while loading a scenario file.
#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    /// The file could not be read from disk.
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    /// The file contents are not a valid scenario document.
    #[error("scenario file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The scenario would start with an empty battlefield.
    #[error("scenario deploys no units")]
    EmptyRoster,
}

/// Complete description of one headless encounter.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Number of grid columns.
    #[serde(default = "default_dimension")]
    pub(crate) width: i32,
    /// Number of grid rows.
    #[serde(default = "default_dimension")]
    pub(crate) height: i32,
    /// Healing potions available to the player faction.
    #[serde(default = "default_potions")]
    pub(crate) healing_potions: u32,
    /// Units deployed before the encounter starts.
    pub(crate) units: Vec<UnitSpec>,
    /// Player intents replayed in order during player turns.
    #[serde(default)]
    pub(crate) script: Vec<PlayerIntent>,
}

fn default_dimension() -> i32 {
    DEFAULT_DIMENSION
}

fn default_potions() -> u32 {
    DEFAULT_POTIONS
}

impl Scenario {
    /// Loads and validates a scenario from the provided path.
    pub(crate) fn load(path: &Path) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path)?;
        let scenario: Self = serde_json::from_str(&contents)?;
        if scenario.units.is_empty() {
            return Err(ScenarioError::EmptyRoster);
        }
        Ok(scenario)
    }

    /// Battlefield configuration described by the scenario.
    pub(crate) fn config(&self) -> BattleConfig {
        BattleConfig {
            width: self.width,
            height: self.height,
            healing_potions: self.healing_potions,
        }
    }

    /// Built-in demo encounter: one swordsman trading blows with one lancer.
    ///
    /// The script walks the swordsman into melee and slugs it out, spending
    /// the healing potion along the way.
    pub(crate) fn demo() -> Self {
        let swordsman = UnitSpec {
            name: "Swordsman".to_owned(),
            faction: Faction::Ally,
            stats: UnitStats {
                max_hp: 20,
                attack: 8,
                defense: 3,
                move_range: 5,
                attack_range: 1,
            },
            position: GridPos::new(1, 3),
        };
        let lancer = UnitSpec {
            name: "Lancer".to_owned(),
            faction: Faction::Enemy,
            stats: UnitStats {
                max_hp: 22,
                attack: 9,
                defense: 4,
                move_range: 4,
                attack_range: 1,
            },
            position: GridPos::new(6, 4),
        };

        let mut script = vec![
            PlayerIntent::SelectAt(GridPos::new(1, 3)),
            PlayerIntent::EnterMoveMode,
            PlayerIntent::CommitMove(GridPos::new(5, 4)),
            PlayerIntent::EndTurn,
        ];
        for _ in 0..2 {
            script.extend([
                PlayerIntent::SelectAt(GridPos::new(5, 4)),
                PlayerIntent::EnterAttackMode,
                PlayerIntent::CommitAttack(GridPos::new(6, 4)),
                PlayerIntent::EndTurn,
            ]);
        }
        script.extend([
            PlayerIntent::SelectAt(GridPos::new(5, 4)),
            PlayerIntent::UseItem,
            PlayerIntent::EndTurn,
        ]);
        script.extend([
            PlayerIntent::SelectAt(GridPos::new(5, 4)),
            PlayerIntent::EnterAttackMode,
            PlayerIntent::CommitAttack(GridPos::new(6, 4)),
            PlayerIntent::EndTurn,
        ]);

        Self {
            width: DEFAULT_DIMENSION,
            height: DEFAULT_DIMENSION,
            healing_potions: DEFAULT_POTIONS,
            units: vec![swordsman, lancer],
            script,
        }
    }
}
