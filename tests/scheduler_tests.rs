//! Resolution loop integration tests.
//!
//! Providers here are tiny stand-ins for card content: a ward that cancels
//! losses, effects that react to losses, charms offering optional
//! responses, and an observer that records stack lengths every time it is
//! consulted.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use eldritch::commands::Command;
use eldritch::content::{ContentRegistry, GlobalEffect, Hook, Provider};
use eldritch::core::{CharacterId, CommandError, EventId, GameConfig, GameError, GameState, GlobalSlot};
use eldritch::entities::{CharacterTemplate, CheckType, Place, PlaceKind, Possession, PossessionKind};
use eldritch::events::{
    Cancel, Check, Event, EventKind, EventRef, GainOrLoss, MultipleChoice, Nothing, Resource,
    Sequence,
};
use eldritch::stack::{Suspension, Timing};

fn table(registry: ContentRegistry, possession: Option<&str>) -> (GameState, CharacterId, CharacterId) {
    let mut state = GameState::new(GameConfig::new(11).test_mode(), Arc::new(registry));
    state.add_place(Place::new("Library", PlaceKind::Location)).unwrap();
    let template = |name: &str| {
        let mut t = CharacterTemplate::new(name, "Library").with_money(0, 1);
        if let Some(item) = possession {
            t = t.with_possession(Possession::new(item, PossessionKind::Common));
        }
        t
    };
    let ada = state.add_character(&template("Ada")).unwrap();
    let bob = state.add_character(&template("Bob")).unwrap();
    (state, ada, bob)
}

fn texts(state: &GameState) -> Vec<(usize, String)> {
    state
        .log()
        .lines()
        .into_iter()
        .map(|line| (line.depth, line.text))
        .collect()
}

/// Cancels every gain or loss.
struct Ward;

impl Provider for Ward {
    fn interrupt(&self, hook: &Hook<'_>) -> Option<Event> {
        match hook.event.kind {
            EventKind::GainOrLoss(_) => Some(Cancel::new(hook.event_id).into()),
            _ => None,
        }
    }
}

/// Reacts to stamina losses with a gain of `resource`.
struct Consolation(Resource);

impl Provider for Consolation {
    fn trigger(&self, hook: &Hook<'_>) -> Option<Event> {
        let EventKind::GainOrLoss(change) = &hook.event.kind else {
            return None;
        };
        if !change.lost(Resource::Stamina) {
            return None;
        }
        Some(GainOrLoss::gain(hook.event.character()?, self.0, 1).into())
    }
}

/// Offers its holder a clue spend before any check, while they have clues.
struct LuckyCharm;

impl Provider for LuckyCharm {
    fn usable_interrupt(&self, hook: &Hook<'_>) -> Option<Event> {
        let holder = hook.owner.character()?;
        if !matches!(hook.event.kind, EventKind::Check(_)) {
            return None;
        }
        let clues = hook.state.character(holder).ok()?.clues;
        (clues > 0).then(|| GainOrLoss::loss(holder, Resource::Clues, 1).into())
    }
}

/// Offers its holder a clue spend before any multiple choice.
struct SecondSight;

impl Provider for SecondSight {
    fn usable_interrupt(&self, hook: &Hook<'_>) -> Option<Event> {
        let holder = hook.owner.character()?;
        if !matches!(hook.event.kind, EventKind::MultipleChoice(_)) {
            return None;
        }
        let clues = hook.state.character(holder).ok()?.clues;
        (clues > 0).then(|| GainOrLoss::loss(holder, Resource::Clues, 1).into())
    }
}

/// Offers its holder a heal after they are hurt badly.
struct HealingStone;

impl Provider for HealingStone {
    fn usable_trigger(&self, hook: &Hook<'_>) -> Option<Event> {
        if !hook.is_own() || !matches!(hook.event.kind, EventKind::GainOrLoss(_)) {
            return None;
        }
        let holder = hook.owner.character()?;
        let stamina = hook.state.character(holder).ok()?.stamina;
        (stamina <= 2).then(|| GainOrLoss::gain(holder, Resource::Stamina, 3).into())
    }
}

/// Records stack lengths whenever it is consulted.
#[derive(Clone, Default)]
struct Observer {
    on_open: Arc<Mutex<Vec<(usize, usize, usize, usize)>>>,
    on_close: Arc<Mutex<Vec<(usize, usize, usize, usize)>>>,
}

impl Provider for Observer {
    fn interrupt(&self, hook: &Hook<'_>) -> Option<Event> {
        self.on_open.lock().unwrap().push(hook.state.stack().lengths());
        None
    }

    fn trigger(&self, hook: &Hook<'_>) -> Option<Event> {
        self.on_close.lock().unwrap().push(hook.state.stack().lengths());
        None
    }
}

// =============================================================================
// Interrupts and Triggers
// =============================================================================

/// A cancelling interrupt stops the event and suppresses its triggers.
#[test]
fn test_interrupt_cancels() {
    let registry = ContentRegistry::new().with_behaviour("Ward", Ward);
    let (mut state, ada, _) = table(registry, None);
    state.set_global(GlobalSlot::Environment, GlobalEffect::new("Ward"));

    let loss = state.push_event(GainOrLoss::loss(ada, Resource::Stamina, 9));
    assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);

    let event = state.event(loss).unwrap();
    assert!(event.is_cancelled());
    assert_eq!(event.resolve_calls(), 0);
    assert_eq!(state.character(ada).unwrap().stamina, 5);
    assert_eq!(texts(&state)[0].1, "Ada loses 9 stamina (cancelled)");
}

/// Triggers run in global slot order, each nested under the event.
#[test]
fn test_trigger_order() {
    let registry = ContentRegistry::new()
        .with_behaviour("Heat Wave", Consolation(Resource::Dollars))
        .with_behaviour("Strange Lights", Consolation(Resource::Clues));
    let (mut state, ada, _) = table(registry, None);
    // Mounted out of order on purpose.
    state.set_global(GlobalSlot::Rumor, GlobalEffect::new("Strange Lights"));
    state.set_global(GlobalSlot::Environment, GlobalEffect::new("Heat Wave"));

    state.push_event(GainOrLoss::loss(ada, Resource::Stamina, 1));
    state.resolve_loop().unwrap();

    assert_eq!(
        texts(&state),
        vec![
            (0, "Ada loses 1 stamina".to_string()),
            (1, "Ada gains 1 dollars".to_string()),
            (1, "Ada gains 1 clues".to_string()),
        ]
    );
}

/// Stacks stay in lockstep: one frame ahead while opening, equal after.
#[test]
fn test_lockstep_observed() {
    let observer = Observer::default();
    let registry = ContentRegistry::new().with_behaviour("Observer", observer.clone());
    let (mut state, ada, _) = table(registry, None);
    state.set_global(GlobalSlot::Other(0), GlobalEffect::new("Observer"));

    state.queue_rolls([5, 5, 5, 5]);
    state.push_event(Sequence::new(
        Some(ada),
        vec![
            Check::new(ada, CheckType::Luck, 0).into(),
            GainOrLoss::loss(ada, Resource::Sanity, 1).into(),
        ],
    ));
    state.resolve_loop().unwrap();

    let opened = observer.on_open.lock().unwrap();
    let closed = observer.on_close.lock().unwrap();
    assert!(!opened.is_empty());
    for &(events, interrupts, triggers, logs) in opened.iter() {
        assert_eq!(events, interrupts + 1);
        assert_eq!(interrupts, triggers);
        assert_eq!(triggers, logs);
    }
    for &(events, interrupts, triggers, logs) in closed.iter() {
        assert_eq!((events, interrupts, triggers), (logs, logs, logs));
    }
    assert_eq!(opened.len(), closed.len());
}

// =============================================================================
// Resolve Once
// =============================================================================

/// Children are resolved exactly as often as their contract needs.
#[test]
fn test_resolve_once() {
    let (mut state, ada, _) = table(ContentRegistry::new(), None);
    let mut early = Event::from(Nothing::new());
    early.resolve(EventId::new(0), &mut state).unwrap();

    let root = state.push_event(Sequence::new(
        Some(ada),
        vec![
            Nothing::new().into(),
            EventRef::from(early),
            GainOrLoss::gain(ada, Resource::Dollars, 1).into(),
        ],
    ));
    state.resolve_loop().unwrap();

    let sequence = state.event(root).unwrap();
    // Two pushes and the finishing call.
    assert_eq!(sequence.resolve_calls(), 3);
    for child in sequence.children() {
        let child = state.event(child).unwrap();
        assert!(child.is_resolved());
        assert_eq!(child.resolve_calls(), 1);
    }
}

/// A frame pushed already resolved is popped without another resolve.
#[test]
fn test_resolved_frame_not_resolved_again() {
    let (mut state, ..) = table(ContentRegistry::new(), None);
    let mut done = Event::from(Nothing::new());
    done.resolve(EventId::new(0), &mut state).unwrap();

    let id = state.push_event(done);
    assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);
    assert_eq!(state.event(id).unwrap().resolve_calls(), 1);
    assert!(state.stack().is_empty());
}

// =============================================================================
// Usables
// =============================================================================

fn charmed_check(first_passes: bool) {
    let registry = ContentRegistry::new().with_behaviour("Lucky Charm", LuckyCharm);
    let (mut state, ada, bob) = table(registry, Some("Lucky Charm"));

    let check = state.push_event(Check::new(ada, CheckType::Luck, 0));
    assert_eq!(
        state.resolve_loop().unwrap(),
        Suspension::Usable {
            event: check,
            timing: Timing::Before,
            characters: vec![ada, bob],
        }
    );

    let (first, second) = if first_passes { (bob, ada) } else { (ada, bob) };
    let first_command = if first_passes { Command::DoneUsing } else { Command::Use(0) };
    let waiting = state.handle(first, first_command).unwrap();
    assert_eq!(
        waiting,
        Suspension::Usable {
            event: check,
            timing: Timing::Before,
            characters: vec![second],
        }
    );
    assert!(state.stack().contains(check));
    assert!(!state.event(check).unwrap().is_resolved());

    let second_command = if first_passes { Command::Use(0) } else { Command::DoneUsing };
    assert_eq!(state.handle(second, second_command).unwrap(), Suspension::Idle);
    assert!(state.event(check).unwrap().is_resolved());
    assert_eq!(state.character(ada).unwrap().clues, 0);
    assert_eq!(state.character(bob).unwrap().clues, 1);
}

/// Both characters must answer before the frame moves on: pass then use.
#[test]
fn test_two_usables_pass_first() {
    charmed_check(true);
}

/// Both characters must answer before the frame moves on: use then pass.
#[test]
fn test_two_usables_use_first() {
    charmed_check(false);
}

/// Other players answer their offers while a choice is still open.
#[test]
fn test_usables_during_open_choice() {
    let registry = ContentRegistry::new().with_behaviour("Second Sight", SecondSight);
    let (mut state, ada, bob) = table(registry, Some("Second Sight"));

    let choice = state.push_event(MultipleChoice::new(ada, "Open the door?", ["Yes", "No"]));
    let open = Suspension::Choice {
        event: choice,
        character: Some(ada),
    };
    assert_eq!(state.resolve_loop().unwrap(), open);
    assert_eq!(state.snapshot(Some(bob)).unwrap().usables.len(), 1);

    // Bob spends a clue; the choice stays open.
    assert_eq!(state.handle(bob, Command::Use(0)).unwrap(), open);
    assert_eq!(state.character(bob).unwrap().clues, 0);
    assert!(state.snapshot(Some(bob)).unwrap().usables.is_empty());
    assert_eq!(
        state.handle(bob, Command::DoneUsing),
        Err(GameError::Rejected(CommandError::NotYourTurn(bob)))
    );

    // Ada passes before choosing, so nothing is asked afterwards.
    assert_eq!(state.handle(ada, Command::DoneUsing).unwrap(), open);
    assert_eq!(state.handle(ada, Command::Choose("Yes".into())).unwrap(), Suspension::Idle);
    assert!(state.event(choice).unwrap().is_resolved());
    assert_eq!(state.character(ada).unwrap().clues, 1);
}

/// An offer left open during a choice is asked for once the choice is made.
#[test]
fn test_choice_then_usable() {
    let registry = ContentRegistry::new().with_behaviour("Second Sight", SecondSight);
    let (mut state, ada, bob) = table(registry, Some("Second Sight"));

    let choice = state.push_event(MultipleChoice::new(ada, "Open the door?", ["Yes", "No"]));
    state.resolve_loop().unwrap();
    assert_eq!(
        state.handle(ada, Command::Choose("No".into())).unwrap(),
        Suspension::Usable {
            event: choice,
            timing: Timing::Before,
            characters: vec![ada, bob],
        }
    );
    state.handle(ada, Command::DoneUsing).unwrap();
    assert_eq!(state.handle(bob, Command::DoneUsing).unwrap(), Suspension::Idle);
    assert!(state.event(choice).unwrap().is_resolved());
}

/// Usable commands are checked against the offer.
#[test]
fn test_usable_rejections() {
    let registry = ContentRegistry::new().with_behaviour("Lucky Charm", LuckyCharm);
    let (mut state, ada, bob) = table(registry, Some("Lucky Charm"));
    state.push_event(Check::new(ada, CheckType::Luck, 0));
    state.resolve_loop().unwrap();
    state.handle(bob, Command::DoneUsing).unwrap();

    assert_eq!(
        state.handle(bob, Command::Use(0)),
        Err(GameError::Rejected(CommandError::NotYourTurn(bob)))
    );
    assert!(matches!(
        state.handle(ada, Command::Use(1)),
        Err(GameError::Rejected(CommandError::InvalidMove(_)))
    ));
    assert!(matches!(
        state.handle(ada, Command::Roll),
        Err(GameError::Rejected(CommandError::InvalidMove(_)))
    ));
}

/// Optional responses after an event wait until the event resolved.
#[test]
fn test_usable_trigger() {
    let registry = ContentRegistry::new().with_behaviour("Healing Stone", HealingStone);
    let (mut state, ada, _) = table(registry, Some("Healing Stone"));
    state.character_mut(ada).unwrap().stamina = 3;

    let loss = state.push_event(GainOrLoss::loss(ada, Resource::Stamina, 2));
    assert_eq!(
        state.resolve_loop().unwrap(),
        Suspension::Usable {
            event: loss,
            timing: Timing::After,
            characters: vec![ada],
        }
    );
    assert!(state.event(loss).unwrap().is_resolved());

    assert_eq!(state.handle(ada, Command::Use(0)).unwrap(), Suspension::Idle);
    assert_eq!(state.character(ada).unwrap().stamina, 4);
}

// =============================================================================
// Checkpoints
// =============================================================================

/// A suspended game survives a checkpoint and carries on.
#[test]
fn test_checkpoint_mid_suspension() {
    let registry = ContentRegistry::new().with_behaviour("Lucky Charm", LuckyCharm);
    let (mut state, ada, bob) = table(registry.clone(), Some("Lucky Charm"));
    state.push_event(Check::new(ada, CheckType::Luck, 0));
    let waiting = state.resolve_loop().unwrap();

    let bytes = state.checkpoint().unwrap();
    let mut restored = GameState::restore(&bytes, Arc::new(registry)).unwrap();
    assert_eq!(restored.stack().lengths(), state.stack().lengths());
    assert_eq!(restored.pending().unwrap(), Some(waiting));

    restored.handle(ada, Command::DoneUsing).unwrap();
    assert_eq!(restored.handle(bob, Command::DoneUsing).unwrap(), Suspension::Idle);
}

// =============================================================================
// Properties
// =============================================================================

fn nested(ada: CharacterId, shape: &[u8]) -> Event {
    let children: Vec<EventRef> = shape
        .iter()
        .enumerate()
        .map(|(i, &kind)| match kind % 3 {
            0 => EventRef::from(Nothing::new()),
            1 => EventRef::from(GainOrLoss::gain(ada, Resource::Dollars, 1)),
            _ => EventRef::from(nested(ada, &shape[i + 1..shape.len().min(i + 3)])),
        })
        .collect();
    Sequence::new(Some(ada), children).into()
}

proptest! {
    /// Whatever the tree, every consultation sees the stacks in lockstep
    /// and the loop ends with all four empty.
    #[test]
    fn prop_lockstep(shape in proptest::collection::vec(0u8..3, 1..10)) {
        let observer = Observer::default();
        let registry = ContentRegistry::new().with_behaviour("Observer", observer.clone());
        let (mut state, ada, _) = table(registry, None);
        state.set_global(GlobalSlot::Other(0), GlobalEffect::new("Observer"));

        state.push_event(nested(ada, &shape));
        prop_assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);
        prop_assert_eq!(state.stack().lengths(), (0, 0, 0, 0));

        for &(events, interrupts, triggers, logs) in observer.on_open.lock().unwrap().iter() {
            prop_assert_eq!((events, triggers, logs), (interrupts + 1, interrupts, interrupts));
        }
        for &(events, interrupts, triggers, logs) in observer.on_close.lock().unwrap().iter() {
            prop_assert_eq!((events, interrupts, triggers), (logs, logs, logs));
        }
    }
}
