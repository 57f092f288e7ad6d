//! End-to-end scenarios over the public API
//!
//! Each test spawns real actors on the tokio runtime and observes them the
//! only way a host can: through probe channels fed by the behavior and
//! through exit monitors.

use std::time::Duration;

use async_trait::async_trait;
use timewarp::{
    ActorRef, Behavior, Event, ExitReason, KernelError, VirtualTime, spawn, spawn_linked
};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
enum Msg {
    Add(u64),
    Trigger,
    Child(u64),
    Boom
}

#[derive(Debug, PartialEq)]
enum ProbeMsg {
    Applied(VirtualTime, u64),
    Terminated(Vec<(VirtualTime, u64)>)
}

/// Records every applied value into both the state and the probe channel.
struct Summing {
    probe: mpsc::UnboundedSender<ProbeMsg>
}

#[async_trait]
impl Behavior for Summing {
    type Arg = ();
    type State = Vec<(VirtualTime, u64)>;
    type Payload = Msg;

    async fn init(&mut self, _me: &ActorRef<Msg>, _arg: ()) -> anyhow::Result<Self::State> {
        Ok(Vec::new())
    }

    async fn handle_event(
        &mut self,
        _me: &ActorRef<Msg>,
        _now: VirtualTime,
        at: VirtualTime,
        payload: &Msg,
        mut state: Self::State
    ) -> anyhow::Result<Self::State> {
        match payload {
            Msg::Add(value) | Msg::Child(value) => {
                state.push((at, *value));
                let _ = self.probe.send(ProbeMsg::Applied(at, *value));
            }
            Msg::Boom => anyhow::bail!("boom"),
            Msg::Trigger => {}
        }
        Ok(state)
    }

    async fn tick_tock(&mut self, _me: &ActorRef<Msg>, now: VirtualTime, state: Self::State) -> (VirtualTime, Self::State) {
        tokio::time::sleep(Duration::from_millis(1)).await;
        (now, state)
    }

    async fn terminate(&mut self, state: Self::State) {
        let _ = self.probe.send(ProbeMsg::Terminated(state));
    }
}

/// On `Trigger`, emits a causally-linked child to a peer and keeps the
/// linked emission record in its own queue so a rollback can cancel it.
struct Emitter {
    peer: ActorRef<Msg>
}

#[async_trait]
impl Behavior for Emitter {
    type Arg = ();
    type State = ();
    type Payload = Msg;

    async fn init(&mut self, _me: &ActorRef<Msg>, _arg: ()) -> anyhow::Result<()> {
        Ok(())
    }

    async fn handle_event(
        &mut self,
        me: &ActorRef<Msg>,
        _now: VirtualTime,
        at: VirtualTime,
        payload: &Msg,
        state: ()
    ) -> anyhow::Result<()> {
        if let Msg::Trigger = payload {
            let child = Event::linked(&self.peer, at + 2, Msg::Child(42));
            let mut remote = child.clone();
            remote.link = None;
            me.notify(child)?;
            self.peer.notify(remote)?;
        }
        Ok(state)
    }

    async fn tick_tock(&mut self, _me: &ActorRef<Msg>, now: VirtualTime, state: ()) -> (VirtualTime, ()) {
        tokio::time::sleep(Duration::from_millis(1)).await;
        (now, state)
    }
}

struct FailingInit;

#[async_trait]
impl Behavior for FailingInit {
    type Arg = ();
    type State = ();
    type Payload = Msg;

    async fn init(&mut self, _me: &ActorRef<Msg>, _arg: ()) -> anyhow::Result<()> {
        anyhow::bail!("refused to start")
    }

    async fn handle_event(
        &mut self,
        _me: &ActorRef<Msg>,
        _now: VirtualTime,
        _at: VirtualTime,
        _payload: &Msg,
        state: ()
    ) -> anyhow::Result<()> {
        Ok(state)
    }

    async fn tick_tock(&mut self, _me: &ActorRef<Msg>, now: VirtualTime, state: ()) -> (VirtualTime, ()) {
        (now, state)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn next_probe(rx: &mut mpsc::UnboundedReceiver<ProbeMsg>) -> ProbeMsg {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("probe timed out")
        .expect("probe channel closed")
}

#[tokio::test(flavor = "multi_thread")]
async fn ordered_delivery_then_stop() {
    init_tracing();
    let (probe, mut probe_rx) = mpsc::unbounded_channel();
    let (actor, monitor) = spawn_linked(Summing { probe }, ()).await.unwrap();

    for lvt in 1..=3 {
        actor.notify(Event::new(lvt, Msg::Add(lvt * 10))).unwrap();
    }

    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(1, 10));
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(2, 20));
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(3, 30));

    actor.stop("done").unwrap();
    assert_eq!(monitor.wait().await, ExitReason::Stopped("done".to_string()));
    assert_eq!(
        next_probe(&mut probe_rx).await,
        ProbeMsg::Terminated(vec![(1, 10), (2, 20), (3, 30)])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn straggler_rolls_back_and_replays() {
    init_tracing();
    let (probe, mut probe_rx) = mpsc::unbounded_channel();
    let (actor, monitor) = spawn_linked(Summing { probe }, ()).await.unwrap();

    actor.notify_batch(vec![Event::new(1, Msg::Add(1)), Event::new(3, Msg::Add(3))]).unwrap();
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(1, 1));
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(3, 3));

    // the actor is at lvt 3; this is a straggler
    actor.notify(Event::new(2, Msg::Add(2))).unwrap();
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(2, 2));
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(3, 3));

    actor.stop("done").unwrap();
    assert_eq!(monitor.wait().await, ExitReason::Stopped("done".to_string()));
    assert_eq!(
        next_probe(&mut probe_rx).await,
        ProbeMsg::Terminated(vec![(1, 1), (2, 2), (3, 3)])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn antievent_in_the_same_burst_cancels_without_any_work() {
    init_tracing();
    let (probe, mut probe_rx) = mpsc::unbounded_channel();
    let (actor, monitor) = spawn_linked(Summing { probe }, ()).await.unwrap();

    let event = Event::new(5, Msg::Add(50));
    actor.notify_batch(vec![event.clone(), event.antievent()]).unwrap();
    actor.notify(Event::new(6, Msg::Add(6))).unwrap();

    // the annihilated pair leaves no trace; the next event applies cleanly
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(6, 6));

    actor.stop("done").unwrap();
    assert_eq!(monitor.wait().await, ExitReason::Stopped("done".to_string()));
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Terminated(vec![(6, 6)]));
}

#[tokio::test(flavor = "multi_thread")]
async fn antievent_after_application_restores_the_untouched_state() {
    init_tracing();
    let (probe, mut probe_rx) = mpsc::unbounded_channel();
    let (actor, monitor) = spawn_linked(Summing { probe }, ()).await.unwrap();

    let event = Event::new(5, Msg::Add(50));
    actor.notify(event.clone()).unwrap();
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(5, 50));
    actor.notify(Event::new(10, Msg::Add(1))).unwrap();
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(10, 1));

    actor.notify(event.antievent()).unwrap();
    // rollback to 5, annihilate, replay the survivor
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(10, 1));

    actor.stop("done").unwrap();
    assert_eq!(monitor.wait().await, ExitReason::Stopped("done".to_string()));
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Terminated(vec![(10, 1)]));
}

#[tokio::test(flavor = "multi_thread")]
async fn rolled_back_emitter_cancels_its_child_at_the_peer() {
    init_tracing();
    let (probe, mut probe_rx) = mpsc::unbounded_channel();
    let (consumer, monitor) = spawn_linked(Summing { probe }, ()).await.unwrap();
    let emitter = spawn(Emitter { peer: consumer.clone() }, ()).await.unwrap();

    emitter.notify(Event::new(7, Msg::Trigger)).unwrap();
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(9, 42));

    consumer.notify(Event::new(12, Msg::Add(1))).unwrap();
    assert_eq!(next_probe(&mut probe_rx).await, ProbeMsg::Applied(12, 1));

    // a straggler rolls the emitter back past the trigger: the child is
    // cancelled at the consumer and re-emitted with a fresh id on replay
    emitter.notify(Event::new(5, Msg::Add(5))).unwrap();

    let mut seen_child_again = false;
    let mut last = None;
    while !(seen_child_again && last == Some(ProbeMsg::Applied(12, 1))) {
        let message = next_probe(&mut probe_rx).await;
        if message == ProbeMsg::Applied(9, 42) {
            seen_child_again = true;
        }
        last = Some(message);
    }

    consumer.stop("done").unwrap();
    assert_eq!(monitor.wait().await, ExitReason::Stopped("done".to_string()));
    // exactly one child effect survives, as if the first was never sent
    assert_eq!(
        next_probe(&mut probe_rx).await,
        ProbeMsg::Terminated(vec![(9, 42), (12, 1)])
    );

    emitter.stop("done").unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn init_failure_is_returned_to_the_spawner() {
    init_tracing();
    let error = spawn(FailingInit, ()).await.unwrap_err();
    match error {
        KernelError::InitFailure(reason) => assert!(reason.contains("refused to start")),
        other => panic!("expected an init failure, got {other}")
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn handler_failure_propagates_through_the_monitor() {
    init_tracing();
    let (probe, _probe_rx) = mpsc::unbounded_channel();
    let (actor, monitor) = spawn_linked(Summing { probe }, ()).await.unwrap();

    actor.notify(Event::new(1, Msg::Boom)).unwrap();
    match monitor.wait().await {
        ExitReason::Failed(KernelError::HandlerFailure(reason)) => assert!(reason.contains("boom")),
        other => panic!("expected a handler failure, got {other}")
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn notify_after_stop_reports_a_closed_mailbox() {
    init_tracing();
    let (probe, _probe_rx) = mpsc::unbounded_channel();
    let (actor, monitor) = spawn_linked(Summing { probe }, ()).await.unwrap();

    actor.stop("done").unwrap();
    assert_eq!(monitor.wait().await, ExitReason::Stopped("done".to_string()));

    match actor.notify(Event::new(1, Msg::Add(1))) {
        Err(KernelError::MailboxClosed(_)) => {}
        other => panic!("expected a closed mailbox, got {other:?}")
    }
}
