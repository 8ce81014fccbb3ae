//! Telephone State Machine
//!
//! This example walks a phone through a call.
//!
//! Key concepts:
//! - Fixed, reentrant and ignored transitions
//! - Guarded transitions
//! - Parameterized triggers carrying a caller name
//! - Lifecycle events and transition history
//!
//! Run with: cargo run --example telephone

use liquid_fsm::builder::{Configuration, MachineBuilder};
use liquid_fsm::core::{Guard, ParameterizedTrigger};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Phone {
    Off,
    Ringing,
    Connected,
    OnHold,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Call {
    Ring,
    Connect,
    Hold,
    Resume,
    HangUp,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Telephone State Machine ===\n");

    let connect = ParameterizedTrigger::<Call, String>::new(Call::Connect);
    let line_free = Arc::new(AtomicBool::new(true));
    let line = Arc::clone(&line_free);

    let mut config = Configuration::new();
    config
        .configure(Phone::Off)
        .permit(Call::Ring, Phone::Ringing)?
        .ignore(Call::HangUp)?;
    config
        .configure(Phone::Ringing)
        .on_entry(|| println!("  *ring ring*"))
        .permit_parameterized(&connect, Phone::Connected, |caller: String| {
            println!("  connecting {caller}")
        })?
        .permit(Call::HangUp, Phone::Off)?;
    config
        .configure(Phone::Connected)
        .on_entry(|| println!("  line open"))
        .on_exit(|| println!("  line closed"))
        .permit_if(
            Call::Hold,
            Phone::OnHold,
            Guard::new(move || line.load(Ordering::SeqCst)),
        )?
        .permit(Call::HangUp, Phone::Off)?;
    config
        .configure(Phone::OnHold)
        .permit(Call::Resume, Phone::Connected)?
        .permit_reentry(Call::Hold)?
        .permit(Call::HangUp, Phone::Off)?;

    let phone = MachineBuilder::new(config)
        .initial(Phone::Off)
        .name("desk-phone")
        .track_history(32)
        .on_transition_executed(|event| {
            println!("{:?} -> {:?} via {:?}", event.from, event.to, event.trigger)
        })
        .build()?;

    println!("Initial state: {:?}\n", phone.current_state());

    phone.fire(Call::HangUp)?;
    phone.fire(Call::Ring)?;
    phone.fire_with(&connect, "John Doe".to_string())?;
    phone.fire(Call::Hold)?;
    phone.fire(Call::Hold)?;
    phone.fire(Call::Resume)?;

    line_free.store(false, Ordering::SeqCst);
    match phone.fire(Call::Hold) {
        Ok(()) => println!("held"),
        Err(err) => println!("\nRejected: {err}\n"),
    }
    println!("Permitted now: {:?}", phone.permitted_triggers());

    phone.fire(Call::HangUp)?;

    if let Some(history) = phone.history() {
        println!("\nPath: {:?}", history.get_path());
        println!("Transitions recorded: {}", history.len());
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
