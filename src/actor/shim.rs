//! Callback shim
//!
//! The only place the kernel executes user code. Every call is wrapped so
//! that a panic or an error in a behavior surfaces as a `KernelError`
//! instead of unwinding through the dispatch loop.

use std::{any::Any, panic::AssertUnwindSafe};

use futures::FutureExt;
use tracing::{Level, event};

use crate::{
    actor::handle::ActorRef,
    domain::{constant::lifecycle, error::KernelError, event::VirtualTime},
    port::behavior::Behavior
};

/// Panic-catching wrapper around a behavior
pub(crate) struct BehaviorShim<B> {
    inner: B
}

impl<B: Behavior> BehaviorShim<B> {
    pub(crate) fn new(inner: B) -> Self {
        Self { inner }
    }

    pub(crate) async fn init(&mut self, me: &ActorRef<B::Payload>, arg: B::Arg) -> Result<B::State, KernelError> {
        match AssertUnwindSafe(self.inner.init(me, arg)).catch_unwind().await {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(reason)) => Err(KernelError::InitFailure(reason.to_string())),
            Err(panic) => Err(KernelError::InitFailure(panic_reason(panic)))
        }
    }

    pub(crate) async fn handle_event(
        &mut self,
        me: &ActorRef<B::Payload>,
        now: VirtualTime,
        at: VirtualTime,
        payload: &B::Payload,
        state: B::State
    ) -> Result<B::State, KernelError> {
        match AssertUnwindSafe(self.inner.handle_event(me, now, at, payload, state)).catch_unwind().await {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(reason)) => Err(KernelError::HandlerFailure(reason.to_string())),
            Err(panic) => Err(KernelError::HandlerFailure(panic_reason(panic)))
        }
    }

    pub(crate) async fn tick_tock(
        &mut self,
        me: &ActorRef<B::Payload>,
        now: VirtualTime,
        state: B::State
    ) -> Result<(VirtualTime, B::State), KernelError> {
        match AssertUnwindSafe(self.inner.tick_tock(me, now, state)).catch_unwind().await {
            Ok((next, _)) if next < now => Err(KernelError::InvariantViolation(format!(
                "tick_tock moved time backwards, {next} < {now}"
            ))),
            Ok(advanced) => Ok(advanced),
            Err(panic) => Err(KernelError::HandlerFailure(panic_reason(panic)))
        }
    }

    pub(crate) async fn terminate(&mut self, state: B::State) {
        if let Err(panic) = AssertUnwindSafe(self.inner.terminate(state)).catch_unwind().await {
            event!(Level::WARN, event = lifecycle::TERMINATE_FAILED, reason = %panic_reason(panic));
        }
    }
}

fn panic_reason(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "behavior panicked".to_string()
    }
}
