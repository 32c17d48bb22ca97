//! Turn rotation tests.
//!
//! These games run outside test mode: an empty stack advances the turn and
//! dice wait for a `Roll` command.

use std::sync::Arc;

use eldritch::commands::Command;
use eldritch::content::{ContentRegistry, GlobalEffect};
use eldritch::core::{CharacterId, CommandError, GameConfig, GameError, GameState, GlobalSlot};
use eldritch::decks::DeckId;
use eldritch::entities::{CharacterTemplate, Place, PlaceKind};
use eldritch::events::{CounterChange, Devoured, EventKind};
use eldritch::rules::{GameStage, TurnPhase};
use eldritch::stack::Suspension;

fn two_seats(registry: ContentRegistry) -> (GameState, CharacterId, CharacterId) {
    let mut state = GameState::new(GameConfig::new(5), Arc::new(registry));
    let library = state.add_place(Place::new("Library", PlaceKind::Location)).unwrap();
    let streets = state.add_place(Place::new("Northside Streets", PlaceKind::Street)).unwrap();
    state.connect(library, streets).unwrap();
    let ada = state.add_character(&CharacterTemplate::new("Ada", "Library")).unwrap();
    let bob = state.add_character(&CharacterTemplate::new("Bob", "Library")).unwrap();
    (state, ada, bob)
}

/// Mount an ancient one with the given doom track.
fn ancient_one(state: &mut GameState, doom: i64, max_doom: i64) {
    state.set_global(
        GlobalSlot::AncientOne,
        GlobalEffect::new("Yig")
            .with_counter("doom", doom)
            .with_counter("max_doom", max_doom),
    );
}

/// The answer a passive player gives to whatever is pending.
fn pass(state: &GameState, pending: &Suspension) -> (CharacterId, Command) {
    match pending {
        Suspension::Sliders { character: Some(c), .. } => (*c, Command::DoneSliders),
        Suspension::DiceRoll { character: Some(c), .. } => (*c, Command::Roll),
        Suspension::Usable { characters, .. } => (characters[0], Command::DoneUsing),
        Suspension::Choice { event, character: Some(c) } => match &state.event(*event).unwrap().kind {
            EventKind::CityMovement(_) => (*c, Command::EndMovement),
            other => panic!("no passive answer to {}", other.name()),
        },
        other => panic!("no passive answer to {other:?}"),
    }
}

/// Answer passively until `done` holds. Returns the last suspension.
fn play_until(
    state: &mut GameState,
    mut pending: Suspension,
    done: impl Fn(&GameState, &Suspension) -> bool,
) -> Suspension {
    for _ in 0..200 {
        if done(state, &pending) {
            return pending;
        }
        let (who, command) = pass(state, &pending);
        pending = state.handle(who, command).unwrap();
    }
    panic!("game did not reach the expected point, stuck at {pending:?}");
}

// =============================================================================
// Setup
// =============================================================================

/// Setup asks every character for sliders, then turn one starts at upkeep.
#[test]
fn test_setup_then_first_upkeep() {
    let (mut state, ada, bob) = two_seats(ContentRegistry::new());
    assert_eq!(state.stage(), GameStage::Setup);

    let pending = state.start().unwrap();
    assert!(matches!(pending, Suspension::Sliders { character: Some(c), .. } if c == ada));
    assert_eq!(state.turn_number(), 0);

    let pending = state.handle(ada, Command::DoneSliders).unwrap();
    assert!(matches!(pending, Suspension::Sliders { character: Some(c), .. } if c == bob));

    let pending = state.handle(bob, Command::DoneSliders).unwrap();
    assert_eq!(state.stage(), GameStage::Slumber);
    assert_eq!(state.turn_number(), 1);
    assert_eq!(state.turn().phase, TurnPhase::Upkeep);
    assert_eq!(state.turn().current, ada);
    assert!(matches!(pending, Suspension::Sliders { character: Some(c), .. } if c == ada));
}

// =============================================================================
// Rotation
// =============================================================================

/// Every phase runs for each character before the next phase starts.
#[test]
fn test_phase_major_rotation() {
    let (mut state, ada, bob) = two_seats(ContentRegistry::new());
    let pending = state.start().unwrap();

    let pending = play_until(&mut state, pending, |state, _| state.turn_number() == 2);

    // One root per character and phase, then the shared mythos.
    let lines = state.log().lines();
    let roots: Vec<&str> = lines
        .iter()
        .filter(|line| line.depth == 0)
        .map(|line| line.text.as_str())
        .skip_while(|text| !text.ends_with("'s upkeep"))
        .collect();
    assert_eq!(
        roots,
        vec![
            "Ada's upkeep",
            "Bob's upkeep",
            "Ada's movement",
            "Bob's movement",
            "Ada's encounter",
            "Bob's encounter",
            "Ada's other world encounter",
            "Bob's other world encounter",
            "The mythos deck is empty",
            "Bob's upkeep",
        ]
    );

    // The first player token passed to Bob.
    assert_eq!(state.turn().first_player, bob);
    assert_eq!(state.turn().current, bob);
    assert!(matches!(pending, Suspension::Sliders { character: Some(c), .. } if c == bob));
    assert_ne!(state.turn().first_player, ada);
}

/// A lost turn skips every phase of that character for the turn.
#[test]
fn test_lost_turn_skips_phases() {
    let (mut state, ada, bob) = two_seats(ContentRegistry::new());
    state.character_mut(ada).unwrap().lose_turn_until = Some(1);

    state.start().unwrap();
    state.handle(ada, Command::DoneSliders).unwrap();
    let pending = state.handle(bob, Command::DoneSliders).unwrap();

    // Turn one: Ada's upkeep is skipped, so Bob is asked first.
    assert!(matches!(pending, Suspension::Sliders { character: Some(c), .. } if c == bob));
    assert!(state
        .log()
        .lines()
        .iter()
        .any(|line| line.text == "Ada loses their upkeep"));

    // Ada's turn two upkeep clears the expired status and asks for sliders.
    let pending = play_until(&mut state, pending, |state, _| {
        state.turn_number() == 2 && state.turn().current == ada
    });
    assert_eq!(state.character(ada).unwrap().lose_turn_until, None);
    assert!(matches!(pending, Suspension::Sliders { character: Some(c), .. } if c == ada));
}

// =============================================================================
// The Ancient One
// =============================================================================

/// A doom token from the mythos deck wakes the ancient one; the next round
/// is the final battle.
#[test]
fn test_mythos_awakens() {
    let registry = ContentRegistry::new().with_mythos("Dark Omen", |_, _| {
        Ok(CounterChange::new(GlobalSlot::AncientOne, "doom", 1).into())
    });
    let (mut state, ada, bob) = two_seats(registry);
    ancient_one(&mut state, 0, 1);
    state.decks_mut().fill(DeckId::Mythos, ["Dark Omen"]);

    let pending = state.start().unwrap();
    let pending = play_until(&mut state, pending, |state, _| {
        state.stage() == GameStage::Awakened && state.turn().phase == TurnPhase::Attack
    });

    // The round restarted without passing the first player token.
    assert_eq!(state.turn_number(), 2);
    assert_eq!(state.turn().first_player, ada);
    assert!(matches!(pending, Suspension::DiceRoll { character: Some(c), .. } if c == ada));
    assert!(state.log().lines().iter().any(|line| line.text == "Yig awakens"));

    // Both attacks miss; the ancient one strikes everybody.
    state.queue_rolls([1]);
    let pending = state.handle(ada, Command::Roll).unwrap();
    assert!(matches!(pending, Suspension::DiceRoll { character: Some(c), .. } if c == bob));
    state.queue_rolls([1]);
    let pending = state.handle(bob, Command::Roll).unwrap();

    assert_eq!(state.turn_number(), 3);
    assert_eq!(state.turn().phase, TurnPhase::Upkeep);
    assert_eq!(state.character(ada).unwrap().stamina, 4);
    assert_eq!(state.character(bob).unwrap().stamina, 4);
    assert!(matches!(pending, Suspension::Sliders { character: Some(c), .. } if c == ada));
}

/// Removing the last doom token wins the game.
#[test]
fn test_victory() {
    let registry = ContentRegistry::new().with_mythos("Dark Omen", |_, _| {
        Ok(CounterChange::new(GlobalSlot::AncientOne, "doom", 1).into())
    });
    let (mut state, ada, bob) = two_seats(registry);
    ancient_one(&mut state, 0, 1);
    state.decks_mut().fill(DeckId::Mythos, ["Dark Omen"]);

    let pending = state.start().unwrap();
    play_until(&mut state, pending, |state, _| state.turn().phase == TurnPhase::Attack);

    // One hit each, two investigators: one doom token comes off.
    state.queue_rolls([5]);
    state.handle(ada, Command::Roll).unwrap();
    assert_eq!(state.global(GlobalSlot::AncientOne).unwrap().counter("hits"), Some(1));
    state.queue_rolls([6]);
    let pending = state.handle(bob, Command::Roll).unwrap();

    assert_eq!(pending, Suspension::GameOver(GameStage::Victory));
    assert_eq!(state.stage(), GameStage::Victory);
    assert_eq!(state.global(GlobalSlot::AncientOne).unwrap().counter("doom"), Some(0));
    assert_eq!(
        state.handle(ada, Command::DoneSliders),
        Err(GameError::Rejected(CommandError::GameOver))
    );
}

// =============================================================================
// Replacement
// =============================================================================

/// A devoured seat blocks the end of the mythos phase until it picks a new
/// character.
#[test]
fn test_devoured_seat_is_replaced() {
    // Seats are numbered in the order they are added.
    let ada = CharacterId::new(0);
    let registry = ContentRegistry::new().with_mythos("The Stars Are Right", move |_, _| {
        Ok(Devoured::new(ada).into())
    });
    let (mut state, seated, bob) = two_seats(registry);
    assert_eq!(seated, ada);
    state.add_template(CharacterTemplate::new("Carl", "Northside Streets"));
    state.decks_mut().fill(DeckId::Mythos, ["The Stars Are Right"]);

    let pending = state.start().unwrap();
    let pending = play_until(&mut state, pending, |_, pending| {
        matches!(pending, Suspension::Replacement { .. })
    });
    assert_eq!(pending, Suspension::Replacement { characters: vec![ada] });
    assert_eq!(state.turn_number(), 1);
    assert!(state.character(ada).unwrap().devoured);

    // Only the devoured seat chooses, and only from what is on offer.
    assert_eq!(
        state.handle(bob, Command::ChooseCharacter("Carl".to_string())),
        Err(GameError::Rejected(CommandError::NotYourTurn(bob)))
    );
    assert!(matches!(
        state.handle(ada, Command::ChooseCharacter("Dexter".to_string())),
        Err(GameError::Rejected(CommandError::InvalidMove(_)))
    ));

    let pending = state.handle(ada, Command::ChooseCharacter("Carl".to_string())).unwrap();
    let carl = state.character(ada).unwrap();
    assert_eq!(carl.name, "Carl");
    assert!(!carl.gone);
    assert_eq!(carl.place, state.place_by_name("Northside Streets"));

    assert_eq!(state.turn_number(), 2);
    assert_eq!(state.turn().first_player, bob);
    assert!(matches!(pending, Suspension::Sliders { character: Some(c), .. } if c == bob));
}
