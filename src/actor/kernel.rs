//! Dispatch loop: the per-actor Time Warp core
//!
//! Each step inspects the head of the pending-event buffer and takes one of
//! six actions, in priority order:
//!
//! 1. idle advance (drain the mailbox, or tick virtual time forward),
//! 2. stop,
//! 3. GVT fossil collection,
//! 4. straggler rollback,
//! 5. anti-event annihilation,
//! 6. apply.
//!
//! The order is load-bearing: a straggler must roll history back before the
//! annihilation and apply rules look at it, and the sentinels must win over
//! everything else. `step` performs exactly one iteration so every rule is
//! testable in isolation; `run` is the loop.

use tracing::{Level, event};

use crate::{
    actor::{handle::ActorRef, mailbox::Mailbox, shim::BehaviorShim},
    config::KernelConfig,
    domain::{
        buffer::EventBuffer,
        constant::{dispatch, fossil, lifecycle},
        error::{ExitReason, KernelError},
        event::{Event, Payload, VirtualTime},
        history::StateHistory,
        past::PastEvents
    },
    port::behavior::Behavior
};

/// Per-actor kernel: the three stores plus the virtual clock
pub(crate) struct Kernel<B: Behavior> {
    me:      ActorRef<B::Payload>,
    shim:    BehaviorShim<B>,
    config:  KernelConfig,
    mailbox: Mailbox<B::Payload>,
    buffer:  EventBuffer<B::Payload>,
    past:    PastEvents<B::Payload>,
    history: StateHistory<B::State>,
    lvt:     VirtualTime,
    gvt:     VirtualTime
}

/// Outcome of a single dispatch step
pub(crate) enum Step {
    Continue,
    Exit(ExitReason)
}

enum HeadClass {
    Stop(String),
    Gvt(VirtualTime),
    Data { lvt: VirtualTime, positive: bool }
}

impl<B: Behavior> Kernel<B> {
    /// Run `init` and assemble the kernel. On failure the dispatch loop
    /// never starts and the error belongs to the spawner.
    pub(crate) async fn start(
        behavior: B,
        arg: B::Arg,
        me: ActorRef<B::Payload>,
        mailbox: Mailbox<B::Payload>,
        config: KernelConfig
    ) -> Result<Self, KernelError> {
        let mut shim = BehaviorShim::new(behavior);
        let state = shim.init(&me, arg).await?;
        event!(Level::DEBUG, event = lifecycle::ACTOR_SPAWNED, actor = %me.id());

        Ok(Self {
            me,
            shim,
            config,
            mailbox,
            buffer: EventBuffer::new(),
            past: PastEvents::new(),
            history: StateHistory::new(0, state),
            lvt: 0,
            gvt: 0
        })
    }

    pub(crate) async fn run(mut self) -> ExitReason {
        loop {
            match self.step().await {
                Ok(Step::Continue) => {}
                Ok(Step::Exit(reason)) => return reason,
                Err(error) => return ExitReason::Failed(error)
            }
        }
    }

    /// One iteration of the dispatch loop.
    pub(crate) async fn step(&mut self) -> Result<Step, KernelError> {
        if self.buffer.is_empty() {
            let batch = self.mailbox.drain(self.config.drain_timeout).await;
            if batch.is_empty() {
                return self.tick().await;
            }
            self.buffer.extend(batch);
            return Ok(Step::Continue);
        }

        let Some(head) = self.buffer.peek() else {
            return Ok(Step::Continue);
        };
        let head_id = head.id;
        let class = match &head.payload {
            Payload::Stop(reason) => HeadClass::Stop(reason.clone()),
            Payload::GvtUpdate => HeadClass::Gvt(head.lvt),
            Payload::Data(_) => HeadClass::Data { lvt: head.lvt, positive: head.is_event }
        };

        match class {
            HeadClass::Stop(reason) => {
                self.buffer.pop();
                self.shim.terminate(self.history.head_state().clone()).await;
                event!(
                    Level::INFO,
                    event = lifecycle::ACTOR_STOPPED,
                    actor = %self.me.id(),
                    lvt = self.lvt,
                    discarded = self.buffer.len(),
                    reason = %reason
                );
                Ok(Step::Exit(ExitReason::Stopped(reason)))
            }
            HeadClass::Gvt(bound) => {
                self.buffer.pop();
                self.fossil_collect(bound);
                Ok(Step::Continue)
            }
            HeadClass::Data { lvt, .. } if lvt < self.lvt => {
                self.roll_back(lvt);
                Ok(Step::Continue)
            }
            HeadClass::Data { positive: false, .. } => {
                self.buffer.pop();
                let removed = self.buffer.remove_id(head_id);
                event!(
                    Level::DEBUG,
                    event = dispatch::ANTIEVENT_ANNIHILATED,
                    actor = %self.me.id(),
                    id = %head_id,
                    cancelled = removed
                );
                Ok(Step::Continue)
            }
            HeadClass::Data { .. } => match self.buffer.pop() {
                Some(head) => self.apply(head).await,
                None => Ok(Step::Continue)
            }
        }
    }

    /// Rule 1 with nothing drained: ask the behavior to advance virtual
    /// time spontaneously.
    async fn tick(&mut self) -> Result<Step, KernelError> {
        let state = self.history.head_state().clone();
        let (next, state) = self.shim.tick_tock(&self.me, self.lvt, state).await?;
        self.history.append(next, state)?;
        if next > self.lvt {
            event!(Level::TRACE, event = dispatch::TICK_ADVANCED, actor = %self.me.id(), from = self.lvt, to = next);
        }
        self.lvt = next;
        // A zero drain timeout makes the idle path await-free; yield so the
        // actor cannot starve its runtime.
        tokio::task::yield_now().await;
        Ok(Step::Continue)
    }

    /// Rule 3: drop saved states and past events older than the announced
    /// bound. Stale or premature announcements are discarded; the external
    /// estimator re-announces GVT periodically.
    fn fossil_collect(&mut self, bound: VirtualTime) {
        if bound < self.gvt {
            event!(Level::DEBUG, event = fossil::GVT_STALE, actor = %self.me.id(), bound, gvt = self.gvt);
            return;
        }
        if self.lvt < bound {
            event!(Level::DEBUG, event = fossil::GVT_AHEAD, actor = %self.me.id(), bound, lvt = self.lvt);
            return;
        }

        self.history.truncate_below(bound);
        self.past.truncate_below(bound);
        self.gvt = bound;
        if self.config.compact_on_fossil {
            self.history.shrink_to_fit();
            self.past.shrink_to_fit();
            self.buffer.shrink_to_fit();
        }
        event!(
            Level::DEBUG,
            event = fossil::GVT_COLLECTED,
            actor = %self.me.id(),
            gvt = bound,
            states = self.history.len(),
            past = self.past.len()
        );
    }

    /// Rule 4: a straggler sits at the head. Restore the state that
    /// predates it, return unlinked past events to the buffer for replay
    /// and owe anti-events for the linked ones. The straggler itself stays
    /// at the head for the next step.
    fn roll_back(&mut self, target: VirtualTime) {
        event!(
            Level::DEBUG,
            event = dispatch::STRAGGLER_DETECTED,
            actor = %self.me.id(),
            lvt = self.lvt,
            straggler = target
        );

        let replay = self.past.rollback(target);
        let mut reinjected = 0usize;
        let mut cancelled = 0usize;
        for event in replay {
            if let Some(peer) = &event.link {
                cancelled += 1;
                self.emit_antievent(peer, &event);
            } else {
                reinjected += 1;
                self.buffer.insert(event);
            }
        }

        self.history.truncate_from(target);
        self.lvt = target;
        event!(
            Level::DEBUG,
            event = dispatch::ROLLBACK_COMPLETED,
            actor = %self.me.id(),
            lvt = target,
            reinjected,
            cancelled
        );
    }

    /// Rule 6: run the handler and advance the clock. On failure, flush the
    /// anti-events owed for the optimistic window before aborting, so peers
    /// are not left with speculative work this actor can no longer undo.
    async fn apply(&mut self, head: Event<B::Payload>) -> Result<Step, KernelError> {
        let Payload::Data(payload) = &head.payload else {
            return Err(KernelError::InvariantViolation("sentinel reached the apply rule".to_string()));
        };

        let state = self.history.head_state().clone();
        match self.shim.handle_event(&self.me, self.lvt, head.lvt, payload, state).await {
            Ok(next) => {
                self.history.append(head.lvt, next)?;
                event!(Level::TRACE, event = dispatch::EVENT_APPLIED, actor = %self.me.id(), id = %head.id, lvt = head.lvt);
                self.lvt = head.lvt;
                self.past.push(head)?;
                Ok(Step::Continue)
            }
            Err(error) => {
                event!(
                    Level::ERROR,
                    event = dispatch::HANDLER_FAILED,
                    actor = %self.me.id(),
                    id = %head.id,
                    lvt = head.lvt,
                    error = %error
                );
                self.flush_antievents();
                Ok(Step::Exit(ExitReason::Failed(error)))
            }
        }
    }

    /// Cancel every causal effect newer than the observed GVT.
    fn flush_antievents(&self) {
        for event in self.past.iter().filter(|event| event.lvt > self.gvt) {
            if let Some(peer) = &event.link {
                self.emit_antievent(peer, event);
            }
        }
    }

    fn emit_antievent(&self, peer: &ActorRef<B::Payload>, original: &Event<B::Payload>) {
        match peer.notify(original.antievent()) {
            Ok(()) => {
                event!(Level::TRACE, event = dispatch::ANTIEVENT_EMITTED, id = %original.id, peer = %peer.id());
            }
            Err(error) => {
                event!(
                    Level::WARN,
                    event = dispatch::ANTIEVENT_SEND_FAILED,
                    id = %original.id,
                    peer = %peer.id(),
                    error = %error
                );
            }
        }
    }
}
