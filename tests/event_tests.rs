//! Event family integration tests.
//!
//! Each test pushes events onto a test-mode game and runs the resolution
//! loop until it idles or waits for input.

use std::sync::Arc;

use proptest::prelude::*;

use eldritch::commands::Command;
use eldritch::content::{ContentRegistry, GlobalEffect, Hook, Provider};
use eldritch::core::{CharacterId, EngineError, EventId, GameConfig, GameState, GlobalSlot};
use eldritch::decks::DeckId;
use eldritch::entities::{CharacterTemplate, CheckType, Monster, MonsterLocation, Place, PlaceKind, SliderPair};
use eldritch::events::{
    AttributePrerequisite, Cancel, Check, Condition, Conditional, CounterChange, DiceRoll, Draw,
    DrawSpecific, Event, EventKind, EventRef, ForceMovement, GainOrLoss, MonsterSpawn, Nothing,
    Resource, Sequence, Status, StatusChange,
};
use eldritch::stack::Suspension;
use eldritch::values::{Comparison, Value};

fn arkham() -> (GameState, CharacterId) {
    arkham_with(ContentRegistry::new())
}

fn arkham_with(registry: ContentRegistry) -> (GameState, CharacterId) {
    let config = GameConfig::new(7)
        .test_mode()
        .with_hospital("St. Mary's Hospital")
        .with_asylum("Arkham Asylum");
    let mut state = GameState::new(config, Arc::new(registry));
    let library = state.add_place(Place::new("Library", PlaceKind::Location)).unwrap();
    let streets = state.add_place(Place::new("Miskatonic U. Streets", PlaceKind::Street)).unwrap();
    let hospital = state.add_place(Place::new("St. Mary's Hospital", PlaceKind::Location)).unwrap();
    let asylum = state.add_place(Place::new("Arkham Asylum", PlaceKind::Location)).unwrap();
    state.connect(library, streets).unwrap();
    state.connect(streets, hospital).unwrap();
    state.connect(streets, asylum).unwrap();
    let ada = state.add_character(
        &CharacterTemplate::new("Ada", "Library")
            .with_money(3, 5)
            .with_slider(SliderPair::LoreLuck, 1, 3),
    ).unwrap();
    (state, ada)
}

/// Prevents every skill check.
struct EvilEye;

impl Provider for EvilEye {
    fn interrupt(&self, hook: &Hook<'_>) -> Option<Event> {
        match hook.event.kind {
            EventKind::Check(_) => Some(Cancel::new(hook.event_id).into()),
            _ => None,
        }
    }
}

/// Prevents every bare dice roll.
struct StillAir;

impl Provider for StillAir {
    fn interrupt(&self, hook: &Hook<'_>) -> Option<Event> {
        match hook.event.kind {
            EventKind::DiceRoll(_) => Some(Cancel::new(hook.event_id).into()),
            _ => None,
        }
    }
}

fn adjustment(state: &GameState, id: EventId, resource: Resource) -> Option<i32> {
    match &state.event(id).unwrap().kind {
        EventKind::GainOrLoss(change) => change.final_adjustments()?.get(&resource).copied(),
        other => panic!("not a gain or loss: {}", other.name()),
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Losing 2 stamina at 1 clamps at 0; the knock-out follows as a trigger.
#[test]
fn test_loss_clamps_and_knocks_out() {
    let (mut state, ada) = arkham();
    state.character_mut(ada).unwrap().stamina = 1;

    let loss = state.push_event(GainOrLoss::loss(ada, Resource::Stamina, 2));
    assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);

    // The loss itself only took what was there.
    assert_eq!(adjustment(&state, loss, Resource::Stamina), Some(-1));

    // The knock-out left Ada at the hospital with half her clues.
    let after = state.character(ada).unwrap();
    assert_eq!(after.stamina, 1);
    assert_eq!(after.clues, 3);
    assert_eq!(after.place, state.place_by_name("St. Mary's Hospital"));
    assert_eq!(after.lose_turn_until, Some(1));

    let lines = state.log().lines();
    assert_eq!(lines[0].text, "Ada loses 1 stamina");
    assert_eq!(lines[1].depth, 1);
    assert_eq!(lines[1].text, "Ada is knocked unconscious");
}

/// Sanity loss sends the character to the asylum instead.
#[test]
fn test_sanity_knock_out() {
    let (mut state, ada) = arkham();
    state.push_event(GainOrLoss::loss(ada, Resource::Sanity, 9));
    state.resolve_loop().unwrap();

    let after = state.character(ada).unwrap();
    assert_eq!(after.sanity, 1);
    assert_eq!(after.stamina, 5);
    assert_eq!(after.place, state.place_by_name("Arkham Asylum"));
}

/// Losing both stamina and sanity devours; the last character gone ends
/// the game.
#[test]
fn test_devoured_ends_game() {
    let (mut state, ada) = arkham();
    state.push_event(
        GainOrLoss::loss(ada, Resource::Stamina, 9).and_lose(Resource::Sanity, 9),
    );
    let result = state.resolve_loop().unwrap();

    assert_eq!(result, Suspension::GameOver(eldritch::GameStage::Defeat));
    let after = state.character(ada).unwrap();
    assert!(after.gone);
    assert!(after.devoured);
    assert_eq!(after.place, None);
}

/// Gains cap at the maximum; the recorded adjustment is what changed.
#[test]
fn test_gain_capped() {
    let (mut state, ada) = arkham();
    state.character_mut(ada).unwrap().stamina = 4;
    let heal = state.push_event(GainOrLoss::gain(ada, Resource::Stamina, Value::infinite()));
    state.resolve_loop().unwrap();

    assert_eq!(adjustment(&state, heal, Resource::Stamina), Some(1));
    assert_eq!(state.character(ada).unwrap().stamina, 5);
}

/// A blessing lowers the success threshold; a second one changes nothing.
#[test]
fn test_bless_curse_axis() {
    let (mut state, ada) = arkham();
    state.push_event(StatusChange::new(ada, Status::BlessCurse, 1));
    state.resolve_loop().unwrap();
    assert_eq!(state.success_threshold(ada), Ok(4));

    let again = state.push_event(StatusChange::new(ada, Status::BlessCurse, 1));
    state.resolve_loop().unwrap();
    assert_eq!(state.event(again).unwrap().attribute("delta"), Some(0.0));

    for _ in 0..2 {
        state.push_event(StatusChange::new(ada, Status::BlessCurse, -1));
        state.resolve_loop().unwrap();
    }
    assert_eq!(state.success_threshold(ada), Ok(6));
}

/// Flag statuses record a zero delta when already in the target state.
#[test]
fn test_flag_statuses() {
    let (mut state, ada) = arkham();
    let delta = |state: &mut GameState, status: Status, change: i8| {
        let id = state.push_event(StatusChange::new(ada, status, change));
        state.resolve_loop().unwrap();
        state.event(id).unwrap().attribute("delta")
    };

    assert_eq!(delta(&mut state, Status::Delayed, 1), Some(1.0));
    assert_eq!(delta(&mut state, Status::Delayed, 1), Some(0.0));
    assert!(state.character(ada).unwrap().delayed);

    assert_eq!(delta(&mut state, Status::Retainer, 1), Some(1.0));
    assert_eq!(delta(&mut state, Status::Retainer, -1), Some(-1.0));
    assert_eq!(delta(&mut state, Status::Retainer, -1), Some(0.0));
    assert!(!state.character(ada).unwrap().retainer);

    assert_eq!(delta(&mut state, Status::Arrested, 1), Some(1.0));
    assert_eq!(delta(&mut state, Status::Arrested, 1), Some(0.0));
    let through = state.turn_number() + 1;
    assert_eq!(state.character(ada).unwrap().arrested_until, Some(through));
    assert_eq!(state.character_attribute(ada, "arrested"), Ok(Some(1.0)));
}

// =============================================================================
// Movement
// =============================================================================

/// Forced movement relocates in one tick, even past a monster.
#[test]
fn test_force_movement() {
    let (mut state, ada) = arkham();
    let library = state.place_by_name("Library").unwrap();
    let asylum = state.place_by_name("Arkham Asylum").unwrap();
    let ghoul = state.add_monster(Monster::new("Ghoul", "hex")).unwrap();
    state.monster_mut(ghoul).unwrap().location = MonsterLocation::At(library);

    let id = state.push_event(ForceMovement::new(ada, asylum));
    assert_eq!(state.resolve_loop(), Ok(Suspension::Idle));

    assert_eq!(state.event(id).unwrap().resolve_calls(), 1);
    assert_eq!(state.character(ada).unwrap().place, Some(asylum));
    let lines = state.log().lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text, "Ada is moved to Arkham Asylum");
}

// =============================================================================
// Dice and Checks
// =============================================================================

/// Sanity loss rolled on dice that get prevented loses nothing.
#[test]
fn test_prevented_die_sum_loses_nothing() {
    let registry = ContentRegistry::new().with_behaviour("Still Air", StillAir);
    let (mut state, ada) = arkham_with(registry);
    state.set_global(GlobalSlot::Environment, GlobalEffect::new("Still Air"));

    let roll = Value::die_sum(DiceRoll::new(Some(ada), 2));
    let loss = state.push_event(GainOrLoss::loss(ada, Resource::Sanity, roll));
    assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);

    assert_eq!(adjustment(&state, loss, Resource::Sanity), Some(0));
    assert_eq!(state.character(ada).unwrap().sanity, 5);
}

/// Luck 3 with a -1 modifier rolls two dice; [5, 1] is one success.
#[test]
fn test_luck_check() {
    let (mut state, ada) = arkham();
    assert_eq!(state.stat(ada, CheckType::Luck), Ok(3));
    state.queue_rolls([5, 1]);

    let check = state.push_event(Check::new(ada, CheckType::Luck, -1));
    assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);

    let EventKind::Check(done) = &state.event(check).unwrap().kind else {
        panic!("expected a check");
    };
    assert_eq!(done.successes(), Some(1));
    let dice = done.dice().unwrap();
    assert_eq!(state.event(dice).unwrap().rolls(), Some(&[5u8, 1][..]));
    assert_eq!(state.rng_mut().scripted_len(), 0);
}

/// Modifiers that push the pool below zero roll nothing.
#[test]
fn test_negative_pool_rolls_nothing() {
    let (mut state, ada) = arkham();
    let check = state.push_event(Check::new(ada, CheckType::Lore, -5));
    state.resolve_loop().unwrap();
    assert_eq!(state.event(check).unwrap().attribute("successes"), Some(0.0));
}

/// A check decides a conditional; the rolled dice are never rerolled.
#[test]
fn test_conditional_on_check() {
    let (mut state, ada) = arkham();
    state.queue_rolls([6, 6, 2]);
    let check = Check::new(ada, CheckType::Luck, 0);
    let conditional = Conditional::new(
        Some(ada),
        Condition::on(check, "successes"),
        [
            (0, EventRef::from(GainOrLoss::loss(ada, Resource::Dollars, 1))),
            (2, EventRef::from(GainOrLoss::gain(ada, Resource::Dollars, 5))),
        ],
    )
    .unwrap();
    let id = state.push_event(conditional);
    state.resolve_loop().unwrap();

    assert_eq!(state.event(id).unwrap().attribute("outcome"), Some(2.0));
    assert_eq!(state.character(ada).unwrap().dollars, 8);
}

/// A prevented check leaves the conditional with no outcome instead of
/// failing the game.
#[test]
fn test_conditional_on_prevented_check() {
    let registry = ContentRegistry::new().with_behaviour("Evil Eye", EvilEye);
    let (mut state, ada) = arkham_with(registry);
    state.set_global(GlobalSlot::Environment, GlobalEffect::new("Evil Eye"));

    let conditional = Conditional::pass_fail(
        Some(ada),
        Condition::on(Check::new(ada, CheckType::Luck, 0), "successes"),
        Nothing::new(),
        GainOrLoss::loss(ada, Resource::Sanity, 1),
    )
    .unwrap();
    let id = state.push_event(conditional);
    assert_eq!(state.resolve_loop(), Ok(Suspension::Idle));

    let done = state.event(id).unwrap();
    assert!(done.is_resolved());
    assert!(!done.is_cancelled());
    assert_eq!(done.attribute("outcome"), None);
    assert_eq!(state.character(ada).unwrap().sanity, 5);
    assert!(!state.log().lines().iter().any(|line| line.text.contains("loses")));
}

/// Prerequisites compare with at-least, less-than and exactly.
#[test]
fn test_attribute_prerequisite_operators() {
    let (mut state, ada) = arkham();
    let cases = [
        (Comparison::AtLeast, 5.0, 1.0),
        (Comparison::AtLeast, 6.0, 0.0),
        (Comparison::LessThan, 6.0, 1.0),
        (Comparison::LessThan, 5.0, 0.0),
        (Comparison::Exactly, 5.0, 1.0),
        (Comparison::Exactly, 4.0, 0.0),
    ];
    for (op, threshold, expected) in cases {
        let id = state.push_event(AttributePrerequisite::new(ada, "clues", threshold, op));
        assert_eq!(state.resolve_loop(), Ok(Suspension::Idle));
        let event = state.event(id).unwrap();
        assert_eq!(event.resolve_calls(), 1);
        assert_eq!(event.attribute("result"), Some(expected), "{op:?} {threshold}");
    }
}

/// Floor lookup below every key is fatal.
#[test]
fn test_conditional_below_catch_all_is_fatal() {
    let (mut state, ada) = arkham();
    let conditional = Conditional::new(
        Some(ada),
        Condition::Value(Value::from(-1)),
        [(0, Nothing::new()), (2, Nothing::new())],
    )
    .unwrap();
    state.push_event(conditional);
    assert_eq!(
        state.resolve_loop(),
        Err(EngineError::NoThreshold { observed: -1.0 })
    );
}

/// Outcome maps without a catch-all are refused up front.
#[test]
fn test_conditional_needs_catch_all() {
    let (_, ada) = arkham();
    let result = Conditional::new(Some(ada), Condition::Value(Value::from(3)), [(1, Nothing::new())]);
    assert!(matches!(result, Err(EngineError::MissingCatchAll { lowest: Some(1) })));
}

// =============================================================================
// Cards and Monsters
// =============================================================================

/// Drawing 2 from a 1-card deck keeps the one card with no choice.
#[test]
fn test_draw_short_deck() {
    let (mut state, ada) = arkham();
    state.decks_mut().fill(DeckId::Common, ["Revolver"]);

    let draw = state.push_event(Draw::new(ada, DeckId::Common, 2));
    assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);

    let EventKind::Draw(done) = &state.event(draw).unwrap().kind else {
        panic!("expected a draw");
    };
    assert_eq!(done.drawn(), Some(&["Revolver".to_string()][..]));
    assert_eq!(done.choice(), None);
    assert!(state.decks().is_empty(DeckId::Common));
    assert_eq!(state.character(ada).unwrap().possessions[0].name, "Revolver");
}

/// Drawing from an empty deck is a normal outcome.
#[test]
fn test_draw_empty_deck() {
    let (mut state, ada) = arkham();
    let draw = state.push_event(Draw::new(ada, DeckId::Spells, 1));
    assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);
    assert_eq!(state.event(draw).unwrap().attribute("drawn"), Some(0.0));
    assert!(state.log().lines()[0].text.contains("deck is empty"));
}

/// More cards than kept asks which to keep; the rest go to the bottom in
/// draw order.
#[test]
fn test_draw_keep_choice() {
    let (mut state, ada) = arkham();
    state
        .decks_mut()
        .fill(DeckId::Unique, ["Elder Sign", "Holy Water", "Lamp", "Tome"]);

    state.push_event(Draw::new(ada, DeckId::Unique, 3));
    let waiting = state.resolve_loop().unwrap();
    assert!(matches!(waiting, Suspension::Choice { character: Some(c), .. } if c == ada));

    state.handle(ada, Command::Choose("Holy Water".into())).unwrap();
    let deck: Vec<&String> = state.decks().cards(DeckId::Unique).collect();
    assert_eq!(deck, ["Tome", "Elder Sign", "Lamp"]);
    assert_eq!(state.character(ada).unwrap().possessions[0].name, "Holy Water");
}

/// Asking for a card the deck lacks still resolves.
#[test]
fn test_draw_specific_absent() {
    let (mut state, ada) = arkham();
    state.decks_mut().fill(DeckId::Unique, ["Lamp"]);

    let id = state.push_event(DrawSpecific::new(ada, DeckId::Unique, "Necronomicon"));
    assert_eq!(state.resolve_loop(), Ok(Suspension::Idle));

    assert_eq!(state.event(id).unwrap().attribute("found"), Some(0.0));
    assert_eq!(state.decks().cards(DeckId::Unique).count(), 1);
    assert!(state.character(ada).unwrap().possessions.is_empty());
    assert!(state.log().lines()[0].text.contains("finds no Necronomicon"));
}

/// An empty cup spawns nothing.
#[test]
fn test_spawn_from_empty_cup() {
    let (mut state, _) = arkham();
    let library = state.place_by_name("Library").unwrap();
    state.push_event(MonsterSpawn::new(library));
    state.resolve_loop().unwrap();
    assert!(state.monsters_at(library).is_empty());
    assert!(state.log().lines()[0].text.contains("cup is empty"));
}

/// A spawned monster leaves the cup.
#[test]
fn test_spawn_from_cup() {
    let (mut state, _) = arkham();
    let library = state.place_by_name("Library").unwrap();
    let ghoul = state.add_monster(Monster::new("Ghoul", "hex")).unwrap();
    state.push_event(MonsterSpawn::new(library));
    state.resolve_loop().unwrap();
    assert_eq!(state.monster(ghoul).unwrap().location, MonsterLocation::At(library));
    assert!(state.monsters_in_cup().is_empty());
}

// =============================================================================
// Global Counters
// =============================================================================

/// Counter changes mutate the mounted effect.
#[test]
fn test_counter_change() {
    let (mut state, _) = arkham();
    state.set_global(GlobalSlot::Environment, GlobalEffect::new("Heat Wave").with_counter("terror", 2));
    state.push_event(CounterChange::new(GlobalSlot::Environment, "terror", 3));
    state.resolve_loop().unwrap();
    assert_eq!(state.global(GlobalSlot::Environment).unwrap().counter("terror"), Some(5));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Stamina stays within [0, max] and the recorded adjustment is the
    /// actual change.
    #[test]
    fn prop_gain_or_loss_clamps(start in 0i32..=5, delta in -12i32..12) {
        let (mut state, ada) = arkham();
        state.character_mut(ada).unwrap().stamina = start;
        let change = if delta >= 0 {
            GainOrLoss::gain(ada, Resource::Stamina, delta)
        } else {
            GainOrLoss::loss(ada, Resource::Stamina, -delta)
        };
        let mut event = Event::from(change);
        prop_assert_eq!(event.resolve(EventId::new(0), &mut state), Ok(true));

        let after = state.character(ada).unwrap().stamina;
        prop_assert!((0..=5).contains(&after));
        let EventKind::GainOrLoss(done) = &event.kind else { unreachable!() };
        prop_assert_eq!(done.final_adjustments().unwrap()[&Resource::Stamina], after - start);
    }

    /// Outcomes {0, 2, 4} are picked by floor lookup.
    #[test]
    fn prop_conditional_floor_lookup(observed in 0i32..=5) {
        let (mut state, ada) = arkham();
        let conditional = Conditional::new(
            Some(ada),
            Condition::Value(Value::from(observed)),
            [(0, Nothing::new()), (2, Nothing::new()), (4, Nothing::new())],
        )
        .unwrap();
        let id = state.push_event(conditional);
        state.resolve_loop().unwrap();
        let expected = [0.0, 0.0, 2.0, 2.0, 4.0, 4.0][observed as usize];
        prop_assert_eq!(state.event(id).unwrap().attribute("outcome"), Some(expected));
    }

    /// Sequence children run in their original order. Children already
    /// resolved when it was pushed are passed over, never reordered.
    #[test]
    fn prop_sequence_order(resolved in proptest::collection::vec(any::<bool>(), 1..8)) {
        let (mut state, ada) = arkham();
        let mut children = Vec::new();
        let mut expected = Vec::new();
        for (i, &done) in resolved.iter().enumerate() {
            let amount = i as i32 + 1;
            let mut child = Event::from(GainOrLoss::gain(ada, Resource::Dollars, amount));
            if done {
                child.resolve(EventId::new(0), &mut state).unwrap();
            } else {
                expected.push(format!("Ada gains {amount} dollars"));
            }
            children.push(EventRef::from(child));
        }
        state.push_event(Sequence::new(Some(ada), children));
        prop_assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);

        let lines: Vec<String> = state.log().lines().into_iter().map(|l| l.text).collect();
        prop_assert_eq!(lines, expected);
    }
}
