//! Behavior port: the seam between the kernel and user code
//!
//! A behavior supplies the four operations a TW-actor executes. The kernel
//! runs all of them through its callback shim, so an `Err` or a panic in
//! user code surfaces as the actor's failure reason instead of unwinding
//! through the dispatch loop.

use async_trait::async_trait;

use crate::{
    actor::handle::ActorRef,
    domain::event::VirtualTime
};

/// User-supplied behavior driving a TW-actor
///
/// State snapshots are taken on every virtual-time advance, which is why
/// `State` must be `Clone`; cheap clones (or shared-ownership handles with
/// snapshot semantics) keep rollback inexpensive.
#[async_trait]
pub trait Behavior: Send + Sized + 'static {
    /// Spawn argument consumed by `init`
    type Arg: Send + 'static;

    /// User state carried along the virtual-time axis
    type State: Clone + Send + 'static;

    /// Application payload carried by positive events and their anti-event
    /// twins
    type Payload: Clone + Send + Sync + 'static;

    /// Build the initial state at lvt 0. An error fails the spawn; the
    /// actor never enters its dispatch loop.
    async fn init(&mut self, me: &ActorRef<Self::Payload>, arg: Self::Arg) -> anyhow::Result<Self::State>;

    /// Apply one event. `now` is the actor's lvt before the event and `at`
    /// the event's own lvt, with `at >= now`. An error aborts the actor.
    async fn handle_event(
        &mut self,
        me: &ActorRef<Self::Payload>,
        now: VirtualTime,
        at: VirtualTime,
        payload: &Self::Payload,
        state: Self::State
    ) -> anyhow::Result<Self::State>;

    /// Spontaneous advance while the actor is idle. Must return
    /// `next_lvt >= now`; moving time backwards aborts the actor.
    async fn tick_tock(
        &mut self,
        me: &ActorRef<Self::Payload>,
        now: VirtualTime,
        state: Self::State
    ) -> (VirtualTime, Self::State);

    /// Best-effort cleanup once a stop event is honoured. Failures are
    /// logged and otherwise ignored.
    async fn terminate(&mut self, _state: Self::State) {}
}
