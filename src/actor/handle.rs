//! Actor references, spawning and exit monitoring

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tracing::{Level, event};

use crate::{
    actor::{kernel::Kernel, mailbox::Mailbox, message::Envelope},
    config::KernelConfig,
    domain::{
        constant::lifecycle,
        error::{ExitReason, KernelError},
        event::{ActorId, Event, VirtualTime}
    },
    port::behavior::Behavior
};

/// Sending half of a TW-actor
///
/// Cheap to clone, safe to share across threads, and embeddable in event
/// links. Dropping every reference does not stop the actor; delivery of a
/// stop event does.
pub struct ActorRef<P> {
    id: ActorId,
    tx: mpsc::UnboundedSender<Envelope<P>>
}

impl<P> ActorRef<P> {
    pub(crate) fn new(id: ActorId, tx: mpsc::UnboundedSender<Envelope<P>>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Deliver one event.
    pub fn notify(&self, event: Event<P>) -> Result<(), KernelError> {
        self.send(vec![event])
    }

    /// Deliver many events in a single transport message, so they reach the
    /// dispatch loop as one batch.
    pub fn notify_batch(&self, events: Vec<Event<P>>) -> Result<(), KernelError> {
        self.send(events)
    }

    /// Enqueue a stop event. It sorts ahead of all pending events and is
    /// honoured when it reaches the head of the queue; everything still
    /// pending at that point is discarded.
    pub fn stop(&self, reason: impl Into<String>) -> Result<(), KernelError> {
        self.send(vec![Event::stop(reason)])
    }

    /// Announce `t` as the new global-virtual-time lower bound, triggering
    /// fossil collection of saved states and past events older than `t`.
    pub fn gvt(&self, t: VirtualTime) -> Result<(), KernelError> {
        self.send(vec![Event::gvt_update(t)])
    }

    fn send(&self, events: Vec<Event<P>>) -> Result<(), KernelError> {
        self.tx
            .send(Envelope::Events(events))
            .map_err(|_| KernelError::MailboxClosed(format!("actor {} is gone", self.id)))
    }
}

impl<P> Clone for ActorRef<P> {
    fn clone(&self) -> Self {
        Self { id: self.id, tx: self.tx.clone() }
    }
}

impl<P> fmt::Debug for ActorRef<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef").field("id", &self.id).finish()
    }
}

impl<P> PartialEq for ActorRef<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P> Eq for ActorRef<P> {}

/// Supervisor half of a linked spawn
///
/// Resolves exactly once, to the actor's exit reason.
pub struct ExitMonitor {
    id: ActorId,
    rx: oneshot::Receiver<ExitReason>
}

impl ExitMonitor {
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Await the actor's exit. Resolves to [`ExitReason::Disconnected`] if
    /// the actor vanished without reporting one.
    pub async fn wait(self) -> ExitReason {
        self.rx.await.unwrap_or(ExitReason::Disconnected)
    }
}

/// Start a detached TW-actor with the default configuration.
///
/// Resolves once `init` has run, so an init failure is returned here and
/// the actor never starts.
pub async fn spawn<B: Behavior>(behavior: B, arg: B::Arg) -> Result<ActorRef<B::Payload>, KernelError> {
    spawn_with_config(behavior, arg, KernelConfig::default()).await
}

/// Start a detached TW-actor with an explicit configuration.
pub async fn spawn_with_config<B: Behavior>(
    behavior: B,
    arg: B::Arg,
    config: KernelConfig
) -> Result<ActorRef<B::Payload>, KernelError> {
    let (actor, _monitor) = spawn_inner(behavior, arg, config).await?;
    Ok(actor)
}

/// Start a TW-actor linked to the caller: the returned monitor resolves to
/// the actor's exit reason, normal or not.
pub async fn spawn_linked<B: Behavior>(
    behavior: B,
    arg: B::Arg
) -> Result<(ActorRef<B::Payload>, ExitMonitor), KernelError> {
    spawn_linked_with_config(behavior, arg, KernelConfig::default()).await
}

/// Start a linked TW-actor with an explicit configuration.
pub async fn spawn_linked_with_config<B: Behavior>(
    behavior: B,
    arg: B::Arg,
    config: KernelConfig
) -> Result<(ActorRef<B::Payload>, ExitMonitor), KernelError> {
    spawn_inner(behavior, arg, config).await
}

async fn spawn_inner<B: Behavior>(
    behavior: B,
    arg: B::Arg,
    config: KernelConfig
) -> Result<(ActorRef<B::Payload>, ExitMonitor), KernelError> {
    let id = ActorId::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let me = ActorRef::new(id, tx);
    let (ack_tx, ack_rx) = oneshot::channel();
    let (exit_tx, exit_rx) = oneshot::channel();

    let task_ref = me.clone();
    tokio::spawn(async move {
        match Kernel::start(behavior, arg, task_ref, Mailbox::new(rx), config).await {
            Ok(kernel) => {
                // The spawner may have gone away; the actor runs regardless.
                let _ = ack_tx.send(Ok(()));
                let reason = kernel.run().await;
                if let ExitReason::Failed(error) = &reason {
                    event!(Level::ERROR, event = lifecycle::ACTOR_FAILED, actor = %id, error = %error);
                }
                let _ = exit_tx.send(reason);
            }
            Err(error) => {
                event!(Level::ERROR, event = lifecycle::INIT_FAILED, actor = %id, error = %error);
                let _ = ack_tx.send(Err(error.clone()));
                let _ = exit_tx.send(ExitReason::Failed(error));
            }
        }
    });

    ack_rx
        .await
        .map_err(|_| KernelError::InitFailure("actor task died before acknowledging".to_string()))??;

    Ok((me, ExitMonitor { id, rx: exit_rx }))
}
