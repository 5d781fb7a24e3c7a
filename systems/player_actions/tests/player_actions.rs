use skirmish_core::{
    ActionMode, Event, Faction, GridPos, HighlightKind, PlayerIntent, TurnPhase, UnitId, UnitSpec,
    UnitStats,
};
use skirmish_system_player_actions::PlayerActions;
use skirmish_world::{self as world, query, Battlefield};

fn ally_spec(position: GridPos) -> UnitSpec {
    UnitSpec {
        name: "Swordsman".to_owned(),
        faction: Faction::Ally,
        stats: UnitStats {
            max_hp: 20,
            attack: 8,
            defense: 3,
            move_range: 5,
            attack_range: 1,
        },
        position,
    }
}

fn enemy_spec(position: GridPos) -> UnitSpec {
    UnitSpec {
        name: "Lancer".to_owned(),
        faction: Faction::Enemy,
        stats: UnitStats {
            max_hp: 22,
            attack: 9,
            defense: 4,
            move_range: 4,
            attack_range: 1,
        },
        position,
    }
}

fn deploy(battlefield: &mut Battlefield, spec: UnitSpec) -> UnitId {
    let mut events = Vec::new();
    world::apply(
        battlefield,
        skirmish_core::Command::Deploy { spec },
        &mut events,
    );
    match events.as_slice() {
        [Event::UnitDeployed { unit, .. }] => *unit,
        other => panic!("deployment failed: {other:?}"),
    }
}

fn start(battlefield: &mut Battlefield) {
    let mut events = Vec::new();
    world::apply(battlefield, skirmish_core::Command::StartEncounter, &mut events);
}

/// Feeds one intent through the controller and applies the resulting
/// command batch, returning the events the battlefield broadcast.
fn pump(
    battlefield: &mut Battlefield,
    actions: &mut PlayerActions,
    intent: PlayerIntent,
) -> Vec<Event> {
    let mut commands = Vec::new();
    actions.handle(intent, battlefield, &mut commands);
    let mut events = Vec::new();
    for command in commands {
        world::apply(battlefield, command, &mut events);
    }
    events
}

#[test]
fn selecting_an_ally_highlights_its_cell() {
    let mut battlefield = Battlefield::new();
    let ally = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );

    assert_eq!(actions.selected(), Some(ally));
    assert_eq!(
        query::highlight_view(&battlefield).kind_at(GridPos::new(1, 3)),
        HighlightKind::Selected
    );
}

#[test]
fn enemies_and_empty_cells_cannot_be_selected() {
    let mut battlefield = Battlefield::new();
    let _ = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let events = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(6, 4)),
    );
    assert!(events.is_empty());
    assert_eq!(actions.selected(), None);

    let events = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(3, 3)),
    );
    assert!(events.is_empty());
    assert_eq!(actions.selected(), None);
}

#[test]
fn move_mode_highlights_every_reachable_cell() {
    let mut battlefield = Battlefield::new();
    let _ = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterMoveMode);

    assert_eq!(actions.mode(), ActionMode::Move);
    let expected = query::valid_move_positions(&battlefield, GridPos::new(1, 3), 5);
    let highlight = query::highlight_view(&battlefield);
    for position in &expected {
        assert_eq!(
            highlight.kind_at(*position),
            HighlightKind::MoveTarget,
            "cell {position:?} should be marked as a destination"
        );
    }
    assert_eq!(
        highlight
            .iter()
            .filter(|kind| *kind == HighlightKind::MoveTarget)
            .count(),
        expected.len()
    );
}

#[test]
fn entering_move_mode_twice_toggles_back_to_idle() {
    let mut battlefield = Battlefield::new();
    let _ = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterMoveMode);
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterMoveMode);

    assert_eq!(actions.mode(), ActionMode::Idle);
    assert!(query::highlight_view(&battlefield)
        .iter()
        .all(|kind| kind == HighlightKind::None));
}

#[test]
fn modes_are_mutually_exclusive() {
    let mut battlefield = Battlefield::new();
    let _ = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterMoveMode);
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterAttackMode);
    assert_eq!(actions.mode(), ActionMode::Attack);
}

#[test]
fn committed_move_relocates_and_clears_selection() {
    let mut battlefield = Battlefield::new();
    let ally = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterMoveMode);
    let events = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::CommitMove(GridPos::new(3, 4)),
    );

    assert!(events.contains(&Event::UnitMoved {
        unit: ally,
        from: GridPos::new(1, 3),
        to: GridPos::new(3, 4),
    }));
    assert_eq!(actions.mode(), ActionMode::Idle);
    assert_eq!(actions.selected(), None);
    let view = query::unit_view(&battlefield);
    assert!(view.unit(ally).expect("unit").has_acted);
    assert!(query::highlight_view(&battlefield)
        .iter()
        .all(|kind| kind == HighlightKind::None));
}

#[test]
fn out_of_range_commit_aborts_the_mode_quietly() {
    let mut battlefield = Battlefield::new();
    let ally = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterMoveMode);
    // Distance 7 exceeds the move range of 5.
    let events = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::CommitMove(GridPos::new(7, 4)),
    );

    assert_eq!(events, vec![Event::HighlightsCleared]);
    assert_eq!(actions.mode(), ActionMode::Idle);
    assert_eq!(
        actions.selected(),
        Some(ally),
        "a failed commit keeps the selection"
    );
    let view = query::unit_view(&battlefield);
    let snapshot = view.unit(ally).expect("unit");
    assert_eq!(snapshot.position, GridPos::new(1, 3));
    assert!(!snapshot.has_acted);
}

#[test]
fn attack_mode_highlights_only_reachable_enemies() {
    let mut battlefield = Battlefield::new();
    let _ = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _near = deploy(&mut battlefield, enemy_spec(GridPos::new(1, 4)));
    let _far = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterAttackMode);

    let highlight = query::highlight_view(&battlefield);
    assert_eq!(
        highlight.kind_at(GridPos::new(1, 4)),
        HighlightKind::AttackTarget
    );
    assert_eq!(highlight.kind_at(GridPos::new(6, 4)), HighlightKind::None);
}

#[test]
fn committed_attack_strikes_and_spends_the_action() {
    let mut battlefield = Battlefield::new();
    let ally = deploy(&mut battlefield, ally_spec(GridPos::new(5, 4)));
    let enemy = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(5, 4)),
    );
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterAttackMode);
    let events = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::CommitAttack(GridPos::new(6, 4)),
    );

    assert!(events.contains(&Event::UnitStruck {
        attacker: ally,
        target: enemy,
        damage: 4,
        remaining_hp: 18,
    }));
    assert_eq!(actions.selected(), None);
    let view = query::unit_view(&battlefield);
    assert!(view.unit(ally).expect("unit").has_acted);
}

#[test]
fn attacking_an_empty_cell_exits_the_mode_without_acting() {
    let mut battlefield = Battlefield::new();
    let ally = deploy(&mut battlefield, ally_spec(GridPos::new(5, 4)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(5, 4)),
    );
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EnterAttackMode);
    let events = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::CommitAttack(GridPos::new(4, 4)),
    );

    assert_eq!(events, vec![Event::HighlightsCleared]);
    assert_eq!(actions.mode(), ActionMode::Idle);
    let view = query::unit_view(&battlefield);
    assert!(!view.unit(ally).expect("unit").has_acted);
}

#[test]
fn potion_restores_and_empties_the_pool() {
    let mut battlefield = Battlefield::new();
    let mut bruiser = enemy_spec(GridPos::new(2, 3));
    bruiser.stats.attack = 8;
    let ally = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let enemy = deploy(&mut battlefield, bruiser);
    start(&mut battlefield);

    // Take one 5-point hit so the heal clamps at max hit points.
    let mut events = Vec::new();
    world::apply(&mut battlefield, skirmish_core::Command::EndPlayerTurn, &mut events);
    world::apply(
        &mut battlefield,
        skirmish_core::Command::Strike {
            attacker: enemy,
            target: GridPos::new(1, 3),
        },
        &mut events,
    );
    world::apply(&mut battlefield, skirmish_core::Command::FinishEnemyTurn, &mut events);
    let view = query::unit_view(&battlefield);
    assert_eq!(view.unit(ally).expect("unit").hp, 15);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    let events = pump(&mut battlefield, &mut actions, PlayerIntent::UseItem);

    assert!(events.contains(&Event::PotionUsed {
        unit: ally,
        restored: 5,
        hp: 20,
        potions_left: 0,
    }));
    assert_eq!(query::healing_potions(&battlefield), 0);
    assert_eq!(actions.selected(), None);

    // The pool is empty; a second unit cannot drink.
    let affordances = actions.affordances(&battlefield);
    assert!(!affordances.item_enabled);
}

#[test]
fn wait_spends_the_action_without_board_effect() {
    let mut battlefield = Battlefield::new();
    let ally = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    let events = pump(&mut battlefield, &mut actions, PlayerIntent::Wait);

    assert!(events.contains(&Event::UnitHeld { unit: ally }));
    assert_eq!(actions.selected(), None);
    let view = query::unit_view(&battlefield);
    let snapshot = view.unit(ally).expect("unit");
    assert!(snapshot.has_acted);
    assert_eq!(snapshot.position, GridPos::new(1, 3));
}

#[test]
fn end_turn_hands_control_to_the_enemy_faction() {
    let mut battlefield = Battlefield::new();
    let _ = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let events = pump(&mut battlefield, &mut actions, PlayerIntent::EndTurn);

    assert!(events.contains(&Event::EnemyTurnStarted { turn: 1 }));
    assert_eq!(query::turn_phase(&battlefield), TurnPhase::EnemyTurn);
}

#[test]
fn intents_are_dropped_outside_the_player_turn() {
    let mut battlefield = Battlefield::new();
    let _ = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EndTurn);
    assert_eq!(query::turn_phase(&battlefield), TurnPhase::EnemyTurn);

    let events = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    assert!(events.is_empty());
    assert_eq!(actions.selected(), None);
}

#[test]
fn acted_selection_is_dropped_on_the_next_intent() {
    let mut battlefield = Battlefield::new();
    let ally = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    assert_eq!(actions.selected(), Some(ally));

    // The unit acts through a path the controller never saw.
    let mut events = Vec::new();
    world::apply(
        &mut battlefield,
        skirmish_core::Command::Hold { unit: ally },
        &mut events,
    );

    let events = pump(&mut battlefield, &mut actions, PlayerIntent::EnterMoveMode);
    assert!(events.is_empty(), "stale selection must not open a mode");
    assert_eq!(actions.selected(), None);
    assert_eq!(actions.mode(), ActionMode::Idle);
}

#[test]
fn affordances_follow_selection_state_and_phase() {
    let mut battlefield = Battlefield::new();
    let _ = deploy(&mut battlefield, ally_spec(GridPos::new(1, 3)));
    let _ = deploy(&mut battlefield, enemy_spec(GridPos::new(6, 4)));
    start(&mut battlefield);

    let mut actions = PlayerActions::new();
    let before = actions.affordances(&battlefield);
    assert!(!before.move_enabled);
    assert!(before.end_turn_enabled);

    let _ = pump(
        &mut battlefield,
        &mut actions,
        PlayerIntent::SelectAt(GridPos::new(1, 3)),
    );
    let with_selection = actions.affordances(&battlefield);
    assert!(with_selection.move_enabled);
    assert!(with_selection.attack_enabled);
    assert!(with_selection.item_enabled);
    assert!(with_selection.wait_enabled);

    let _ = pump(&mut battlefield, &mut actions, PlayerIntent::EndTurn);
    let after_end = actions.affordances(&battlefield);
    assert!(!after_end.end_turn_enabled);
}
