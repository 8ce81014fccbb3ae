//! Property-based tests for the transition engine.
//!
//! These tests use proptest to drive machines with random trigger
//! sequences and compare them against a plain transition table.

use chrono::Utc;
use liquid_fsm::builder::Configuration;
use liquid_fsm::core::{StateHistory, StateTransition};
use liquid_fsm::machine::{MoveOptions, StateMachine};
use liquid_fsm::MachineBuilder;
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
enum Phone {
    Off,
    Ringing,
    Connected,
    OnHold,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
enum Call {
    Ring,
    Pickup,
    Hold,
    Resume,
    HangUp,
    Mute,
}

/// What firing `call` from `phone` should do: `None` when unconfigured,
/// `Some(None)` when ignored, `Some(Some(next))` for a transition.
fn expected(phone: Phone, call: Call) -> Option<Option<Phone>> {
    use Call::*;
    use Phone::*;
    match (phone, call) {
        (Off, Ring) => Some(Some(Ringing)),
        (Ringing, Pickup) => Some(Some(Connected)),
        (Ringing, HangUp) => Some(Some(Off)),
        (Ringing, Ring) => Some(None),
        (Connected, Hold) => Some(Some(OnHold)),
        (Connected, HangUp) => Some(Some(Off)),
        (Connected, Mute) => Some(None),
        (OnHold, Resume) => Some(Some(Connected)),
        (OnHold, HangUp) => Some(Some(Off)),
        (OnHold, Hold) => Some(Some(OnHold)),
        _ => None,
    }
}

struct Counters {
    exits: AtomicUsize,
    entries: AtomicUsize,
}

fn phone_config(counters: &Arc<Counters>) -> Configuration<Phone, Call> {
    let mut config = Configuration::new();
    for phone in [Phone::Off, Phone::Ringing, Phone::Connected, Phone::OnHold] {
        let (exit, entry) = (Arc::clone(counters), Arc::clone(counters));
        config
            .configure(phone)
            .on_exit(move || {
                exit.exits.fetch_add(1, Ordering::SeqCst);
            })
            .on_entry(move || {
                entry.entries.fetch_add(1, Ordering::SeqCst);
            });
    }
    config.configure(Phone::Off).permit(Call::Ring, Phone::Ringing).unwrap();
    config
        .configure(Phone::Ringing)
        .permit(Call::Pickup, Phone::Connected)
        .unwrap()
        .permit(Call::HangUp, Phone::Off)
        .unwrap()
        .ignore(Call::Ring)
        .unwrap();
    config
        .configure(Phone::Connected)
        .permit(Call::Hold, Phone::OnHold)
        .unwrap()
        .permit(Call::HangUp, Phone::Off)
        .unwrap()
        .ignore(Call::Mute)
        .unwrap();
    config
        .configure(Phone::OnHold)
        .permit(Call::Resume, Phone::Connected)
        .unwrap()
        .permit(Call::HangUp, Phone::Off)
        .unwrap()
        .permit_reentry(Call::Hold)
        .unwrap();
    config
}

fn counters() -> Arc<Counters> {
    Arc::new(Counters {
        exits: AtomicUsize::new(0),
        entries: AtomicUsize::new(0),
    })
}

prop_compose! {
    fn arbitrary_phone()(variant in 0..4u8) -> Phone {
        match variant {
            0 => Phone::Off,
            1 => Phone::Ringing,
            2 => Phone::Connected,
            _ => Phone::OnHold,
        }
    }
}

prop_compose! {
    fn arbitrary_call()(variant in 0..6u8) -> Call {
        match variant {
            0 => Call::Ring,
            1 => Call::Pickup,
            2 => Call::Hold,
            3 => Call::Resume,
            4 => Call::HangUp,
            _ => Call::Mute,
        }
    }
}

proptest! {
    #[test]
    fn machine_follows_transition_table(
        start in arbitrary_phone(),
        calls in prop::collection::vec(arbitrary_call(), 0..32)
    ) {
        let counters = counters();
        let machine = StateMachine::new(phone_config(&counters), start).unwrap();
        let mut state = start;

        for call in calls {
            let result = machine.fire(call);
            match expected(state, call) {
                None => {
                    let err = result.unwrap_err();
                    prop_assert!(err.is_invalid_trigger());
                }
                Some(None) => prop_assert!(result.is_ok()),
                Some(Some(next)) => {
                    prop_assert!(result.is_ok());
                    state = next;
                }
            }
            prop_assert_eq!(machine.current_state(), state);
        }
    }

    #[test]
    fn callbacks_run_once_per_transition(
        calls in prop::collection::vec(arbitrary_call(), 0..32)
    ) {
        let counters = counters();
        let machine = StateMachine::new(phone_config(&counters), Phone::Off).unwrap();
        let mut state = Phone::Off;
        let mut transitions = 0;

        for call in calls {
            if let Some(Some(next)) = expected(state, call) {
                transitions += 1;
                state = next;
            }
            let _ = machine.fire(call);
        }

        prop_assert_eq!(counters.exits.load(Ordering::SeqCst), transitions);
        prop_assert_eq!(counters.entries.load(Ordering::SeqCst), transitions);
    }

    #[test]
    fn ignored_triggers_have_no_effect(repeats in 1..16usize) {
        let counters = counters();
        let machine = StateMachine::new(phone_config(&counters), Phone::Ringing).unwrap();

        for _ in 0..repeats {
            machine.fire(Call::Ring).unwrap();
        }

        prop_assert_eq!(machine.current_state(), Phone::Ringing);
        prop_assert_eq!(counters.exits.load(Ordering::SeqCst), 0);
        prop_assert_eq!(counters.entries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn history_path_matches_visited_states(
        calls in prop::collection::vec(arbitrary_call(), 0..32)
    ) {
        let counters = counters();
        let machine = MachineBuilder::new(phone_config(&counters))
            .initial(Phone::Off)
            .track_history(64)
            .build()
            .unwrap();
        let mut visited = vec![Phone::Off];

        for call in calls {
            if machine.fire(call).is_ok() && machine.current_state() != *visited.last().unwrap() {
                visited.push(machine.current_state());
            }
        }

        let history = machine.history().unwrap();
        let path: Vec<Phone> = history
            .transitions()
            .filter(|t| !t.is_reentry())
            .map(|t| t.to)
            .collect();
        prop_assert_eq!(&path[..], &visited[1..]);
    }

    #[test]
    fn history_never_exceeds_limit(
        limit in 0..8usize,
        moves in prop::collection::vec(arbitrary_phone(), 0..24)
    ) {
        let counters = counters();
        let machine = MachineBuilder::new(phone_config(&counters))
            .track_history(limit)
            .build()
            .unwrap();

        for phone in &moves {
            machine.move_to_state(*phone, MoveOptions::NONE).unwrap();
        }

        let history = machine.history().unwrap();
        prop_assert_eq!(history.len(), moves.len().min(limit));
        prop_assert!(history.transitions().all(|t| t.trigger.is_none()));
        prop_assert_eq!(counters.entries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn history_roundtrip_serialization(
        steps in prop::collection::vec((arbitrary_phone(), arbitrary_call()), 0..6)
    ) {
        let mut history = StateHistory::with_limit(8);
        let mut from = Phone::Off;
        for (to, call) in steps {
            history.record(StateTransition {
                from,
                to,
                trigger: Some(call),
                timestamp: Utc::now(),
            });
            from = to;
        }

        let json = serde_json::to_string(&history).unwrap();
        let restored: StateHistory<Phone, Call> = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(restored.len(), history.len());
        prop_assert_eq!(restored.get_path(), history.get_path());
    }
}
