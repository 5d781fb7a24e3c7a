#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives headless Skirmish encounters.
//!
//! The driver stands in for every presentation collaborator at once: it
//! feeds scripted player intents into the interaction system, paces the
//! enemy planner, and renders broadcast events as a text log. Pacing only
//! affects readability; outcomes are identical at any delay.

mod scenario;

use std::{path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use skirmish_core::{Command, Event, Faction, Outcome, PlayerIntent, TurnPhase, UnitId};
use skirmish_system_enemy_ai::{EnemyPlanner, StepOutcome};
use skirmish_system_player_actions::PlayerActions;
use skirmish_world::{self as world, query, Battlefield};

use crate::scenario::Scenario;

/// Command-line arguments accepted by the skirmish binary.
#[derive(Debug, Parser)]
#[command(name = "skirmish", about = "Headless driver for turn-based tactics encounters")]
struct Args {
    /// Path to a JSON scenario file; the built-in demo runs when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Milliseconds to pause between enemy steps for readability.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
    /// Render the board after every completed turn.
    #[arg(long)]
    board: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => Scenario::demo(),
    };
    run(scenario, args.delay_ms, args.board);
    Ok(())
}

fn run(scenario: Scenario, delay_ms: u64, show_board: bool) {
    let mut battlefield = Battlefield::with_config(scenario.config());
    let mut events = Vec::new();

    for spec in scenario.units {
        world::apply(&mut battlefield, Command::Deploy { spec }, &mut events);
    }
    world::apply(&mut battlefield, Command::StartEncounter, &mut events);
    report_events(&battlefield, &events);
    events.clear();

    let mut actions = PlayerActions::new();
    let mut planner = EnemyPlanner::new();
    let delay = Duration::from_millis(delay_ms);
    let mut script = scenario.script.into_iter();

    loop {
        match query::turn_phase(&battlefield) {
            TurnPhase::PlayerTurn => {
                let Some(intent) = script.next() else {
                    println!("script exhausted before the encounter was decided");
                    break;
                };
                announce_intent(intent);
                let mut commands = Vec::new();
                actions.handle(intent, &battlefield, &mut commands);
                for command in commands {
                    world::apply(&mut battlefield, command, &mut events);
                }
                report_events(&battlefield, &events);
                events.clear();
            }
            TurnPhase::EnemyTurn => {
                planner.begin_turn(&battlefield);
                loop {
                    let mut commands = Vec::new();
                    let outcome = planner.step(&battlefield, &mut commands);
                    for command in commands {
                        world::apply(&mut battlefield, command, &mut events);
                    }
                    report_events(&battlefield, &events);
                    events.clear();
                    match outcome {
                        StepOutcome::Acted(_) => {
                            if !delay.is_zero() {
                                thread::sleep(delay);
                            }
                        }
                        StepOutcome::TurnComplete | StepOutcome::Idle => break,
                    }
                }
                if show_board {
                    print_board(&battlefield);
                }
            }
            TurnPhase::Victory | TurnPhase::Defeat => break,
        }
    }

    if show_board {
        print_board(&battlefield);
    }
    print_summary(&battlefield);
}

fn announce_intent(intent: PlayerIntent) {
    match intent {
        PlayerIntent::SelectAt(position) => {
            println!("> select ({}, {})", position.x(), position.y());
        }
        PlayerIntent::Select(unit) => println!("> select unit #{}", unit.get()),
        PlayerIntent::EnterMoveMode => println!("> move mode"),
        PlayerIntent::EnterAttackMode => println!("> attack mode"),
        PlayerIntent::CommitMove(position) => {
            println!("> move to ({}, {})", position.x(), position.y());
        }
        PlayerIntent::CommitAttack(position) => {
            println!("> attack ({}, {})", position.x(), position.y());
        }
        PlayerIntent::UseItem => println!("> use potion"),
        PlayerIntent::Wait => println!("> wait"),
        PlayerIntent::EndTurn => println!("> end turn"),
    }
}

fn report_events(battlefield: &Battlefield, events: &[Event]) {
    for event in events {
        match event {
            // Highlight bookkeeping is presentation-only noise in a text log.
            Event::CellHighlighted { .. } | Event::HighlightsCleared => {}
            Event::UnitDeployed {
                unit,
                faction,
                position,
            } => {
                let side = match faction {
                    Faction::Ally => "ally",
                    Faction::Enemy => "enemy",
                };
                println!(
                    "{} {} deployed at ({}, {})",
                    side,
                    unit_name(battlefield, *unit),
                    position.x(),
                    position.y()
                );
            }
            Event::DeployRejected { position, reason } => {
                println!(
                    "deployment at ({}, {}) rejected: {reason:?}",
                    position.x(),
                    position.y()
                );
            }
            Event::PlayerTurnStarted { turn } => println!("-- turn {turn}: player --"),
            Event::EnemyTurnStarted { turn } => println!("-- turn {turn}: enemy --"),
            Event::UnitMoved { unit, from, to } => {
                println!(
                    "{} moves ({}, {}) -> ({}, {})",
                    unit_name(battlefield, *unit),
                    from.x(),
                    from.y(),
                    to.x(),
                    to.y()
                );
            }
            Event::MoveRejected { unit, to, reason } => {
                println!(
                    "{} cannot move to ({}, {}): {reason:?}",
                    unit_name(battlefield, *unit),
                    to.x(),
                    to.y()
                );
            }
            Event::UnitStruck {
                attacker,
                target,
                damage,
                remaining_hp,
            } => {
                println!(
                    "{} hits {} for {damage} ({remaining_hp} hp left)",
                    unit_name(battlefield, *attacker),
                    unit_name(battlefield, *target)
                );
            }
            Event::StrikeRejected {
                attacker,
                target,
                reason,
            } => {
                println!(
                    "{} cannot strike ({}, {}): {reason:?}",
                    unit_name(battlefield, *attacker),
                    target.x(),
                    target.y()
                );
            }
            Event::UnitDied { unit, position } => {
                println!(
                    "{} falls at ({}, {})",
                    unit_name(battlefield, *unit),
                    position.x(),
                    position.y()
                );
            }
            Event::PotionUsed {
                unit,
                restored,
                hp,
                potions_left,
            } => {
                println!(
                    "{} drinks a potion, restoring {restored} hp ({hp} hp, {potions_left} potions left)",
                    unit_name(battlefield, *unit)
                );
            }
            Event::PotionRejected { unit, reason } => {
                println!(
                    "{} cannot drink: {reason:?}",
                    unit_name(battlefield, *unit)
                );
            }
            Event::UnitHeld { unit } => {
                println!("{} holds position", unit_name(battlefield, *unit));
            }
            Event::HoldRejected { unit, reason } => {
                println!(
                    "{} cannot hold: {reason:?}",
                    unit_name(battlefield, *unit)
                );
            }
            Event::EncounterEnded { outcome, turn } => match outcome {
                Outcome::Victory => println!("VICTORY on turn {turn}"),
                Outcome::Defeat => println!("DEFEAT on turn {turn}"),
            },
        }
    }
}

fn unit_name(battlefield: &Battlefield, unit: UnitId) -> String {
    query::unit_view(battlefield)
        .unit(unit)
        .map_or_else(|| format!("unit #{}", unit.get()), |snapshot| snapshot.name.clone())
}

fn print_board(battlefield: &Battlefield) {
    let (width, height) = query::dimensions(battlefield);
    let occupancy = query::occupancy_view(battlefield);
    let view = query::unit_view(battlefield);

    for y in (0..height).rev() {
        let mut row = String::new();
        for x in 0..width {
            let glyph = occupancy
                .occupant(skirmish_core::GridPos::new(x, y))
                .and_then(|id| view.unit(id))
                .map_or('.', |snapshot| match snapshot.faction {
                    Faction::Ally => 'A',
                    Faction::Enemy => 'E',
                });
            row.push(glyph);
            row.push(' ');
        }
        println!("{row}");
    }

    for snapshot in view.iter().filter(|snapshot| snapshot.alive) {
        println!(
            "  {} [{:?}] {}/{} hp at ({}, {})",
            snapshot.name,
            snapshot.faction,
            snapshot.hp,
            snapshot.stats.max_hp,
            snapshot.position.x(),
            snapshot.position.y()
        );
    }
}

fn print_summary(battlefield: &Battlefield) {
    match query::turn_phase(battlefield) {
        TurnPhase::Victory => println!("encounter decided: victory"),
        TurnPhase::Defeat => println!("encounter decided: defeat"),
        phase => println!(
            "encounter undecided after turn {} ({phase:?})",
            query::turn_count(battlefield)
        ),
    }
}
