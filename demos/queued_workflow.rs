//! Queued Order Workflow
//!
//! This example drives an order pipeline from several concurrent tasks.
//!
//! Key concepts:
//! - Async entry callbacks
//! - FIFO serialization of concurrent requests
//! - Re-entering the machine from a callback with `enqueue_fire`
//! - Running every transition on a dedicated worker thread
//!
//! Run with: cargo run --example queued_workflow

use liquid_fsm::builder::{Configuration, ConfigurationError, MachineBuilder};
use liquid_fsm::machine::{QueuedStateMachine, ScheduledStateMachine, WorkerScheduler};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Order {
    Received,
    Packing,
    Shipped,
    Delivered,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Event {
    Pack,
    Ship,
    Deliver,
    Audit,
}

fn pipeline(
    machine: Arc<OnceLock<QueuedStateMachine<Order, Event>>>,
) -> Result<Configuration<Order, Event>, ConfigurationError> {
    let mut config = Configuration::new();
    config
        .configure(Order::Received)
        .permit(Event::Pack, Order::Packing)?
        .permit_reentry(Event::Audit)?;
    config
        .configure(Order::Packing)
        .on_entry_async(move || {
            let machine = Arc::clone(&machine);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                println!("  packed, requesting shipment");
                if let Some(machine) = machine.get() {
                    machine.enqueue_fire(Event::Ship);
                }
            }
        })
        .permit(Event::Ship, Order::Shipped)?
        .ignore(Event::Audit)?;
    config
        .configure(Order::Shipped)
        .permit(Event::Deliver, Order::Delivered)?
        .permit_reentry(Event::Audit)?;
    config.configure(Order::Delivered).ignore(Event::Audit)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Queued Order Workflow ===\n");

    let slot = Arc::new(OnceLock::new());
    let orders = MachineBuilder::new(pipeline(Arc::clone(&slot))?)
        .initial(Order::Received)
        .name("order-42")
        .on_transition_executed(|event| {
            println!("{:?} -> {:?} ({:?})", event.from, event.to, event.trigger)
        })
        .build_queued()?;
    let _ = slot.set(orders.clone());

    // Audits arrive while packing is in flight and queue up behind it. The
    // shipment requested by the packing callback lands after them.
    let pack = orders.fire(Event::Pack);
    let audits = futures::future::join_all((0..3).map(|_| orders.fire(Event::Audit)));
    let (packed, audited) = futures::join!(pack, audits);
    packed?;
    for result in audited {
        result?;
    }

    orders.fire(Event::Deliver).await?;
    println!("\nOrder state: {:?}", orders.current_state());

    println!("\n--- Same pipeline on a worker thread ---\n");
    let worker = WorkerScheduler::spawn("fulfilment")?;
    let mut config = Configuration::new();
    config
        .configure(Order::Received)
        .on_exit(|| {
            let thread = std::thread::current();
            println!("  leaving Received on {:?}", thread.name());
        })
        .permit(Event::Pack, Order::Packing)?;
    let remote = ScheduledStateMachine::new(config, Order::Received, worker)?;
    remote.fire(Event::Pack).await?;
    println!("Remote order state: {:?}", remote.current_state());

    println!("\n=== Example Complete ===");
    Ok(())
}
