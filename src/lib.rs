//! # timewarp
//!
//! An optimistic discrete-event simulation kernel: Jefferson's Time Warp
//! mechanism for a single actor. A TW-actor owns a private virtual clock
//! and processes events that may arrive out of order:
//!
//! - events are buffered in ascending virtual-time order and applied
//!   optimistically;
//! - a **straggler** (an event older than the actor's clock) triggers a
//!   rollback: the state history rewinds, intervening events are re-queued,
//!   and **anti-events** are emitted for causal work owed to peers;
//! - an anti-event annihilates its positive twin by id, before or after
//!   application;
//! - a **GVT** announcement (a global lower bound below which no rollback
//!   can reach) fossil-collects saved states and past events;
//! - when idle, the actor advances time spontaneously through its
//!   behavior's `tick_tock`.
//!
//! # Example
//!
//! ```ignore
//! struct Counter;
//!
//! #[async_trait::async_trait]
//! impl Behavior for Counter {
//!     type Arg = ();
//!     type State = u64;
//!     type Payload = u64;
//!
//!     async fn init(&mut self, _me: &ActorRef<u64>, _arg: ()) -> anyhow::Result<u64> {
//!         Ok(0)
//!     }
//!
//!     async fn handle_event(
//!         &mut self,
//!         _me: &ActorRef<u64>,
//!         _now: VirtualTime,
//!         _at: VirtualTime,
//!         payload: &u64,
//!         state: u64
//!     ) -> anyhow::Result<u64> {
//!         Ok(state + payload)
//!     }
//!
//!     async fn tick_tock(&mut self, _me: &ActorRef<u64>, now: VirtualTime, state: u64) -> (VirtualTime, u64) {
//!         (now, state)
//!     }
//! }
//!
//! let (actor, monitor) = spawn_linked(Counter, ()).await?;
//! actor.notify(Event::new(1, 40))?;
//! actor.notify(Event::new(2, 2))?;
//! actor.stop("done")?;
//! assert_eq!(monitor.wait().await, ExitReason::Stopped("done".into()));
//! ```

pub mod actor;
pub mod config;
pub mod domain;
pub mod port;

pub use actor::handle::{
    ActorRef, ExitMonitor, spawn, spawn_linked, spawn_linked_with_config, spawn_with_config
};
pub use config::KernelConfig;
pub use domain::{
    error::{ExitReason, KernelError},
    event::{ActorId, Event, EventId, Payload, VirtualTime}
};
pub use port::behavior::Behavior;
