//! Events on the virtual-time axis
//!
//! Every message between TW-actors is an [`Event`]: a virtual timestamp, a
//! unique identity, a polarity bit and an opaque payload. An anti-event is
//! the cancellation twin of a previously sent event; the pair is matched by
//! id alone, never by payload equality.

use std::fmt::{self, Display};

use uuid::Uuid;

use crate::actor::handle::ActorRef;

/// Virtual time. Monotonic, non-negative, no wall-clock relation.
pub type VirtualTime = u64;

/// Unique identifier for a TW-actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId(pub(crate) Uuid);

impl ActorId {
    pub(crate) fn new() -> Self {
        ActorId(Uuid::new_v4())
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an event; an anti-event carries its twin's id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub(crate) Uuid);

impl EventId {
    pub(crate) fn new() -> Self {
        EventId(Uuid::new_v4())
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload carried by an event
///
/// `Data` is the only variant that ever reaches a behavior. The other two
/// are kernel-reserved sentinels; they are never stored in the past-event
/// log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<P> {
    /// Application data, opaque to the kernel
    Data(P),
    /// Stop the actor with a reason once this event reaches the queue head
    Stop(String),
    /// New global-virtual-time lower bound, carried in the event's lvt
    GvtUpdate
}

/// An immutable event record
///
/// Events are totally ordered by `(lvt, is_event, id)`. The polarity bit
/// sorts anti-events immediately before positive events of the same
/// `(lvt, id)`, which is what the annihilation rule relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<P> {
    /// Virtual time at which the event takes effect
    pub lvt:      VirtualTime,
    /// Globally unique identity
    pub id:       EventId,
    /// `true` for a positive event, `false` for its anti-event
    pub is_event: bool,
    /// Cancellation address: the peer that receives an anti-event when a
    /// rollback undoes this event. `None` for spontaneous or anti-events.
    pub link:     Option<ActorRef<P>>,
    /// Payload
    pub payload:  Payload<P>
}

impl<P> Event<P> {
    /// Build a non-causal positive event; the id is auto-generated.
    pub fn new(lvt: VirtualTime, payload: P) -> Self {
        Self { lvt, id: EventId::new(), is_event: true, link: None, payload: Payload::Data(payload) }
    }

    /// Build a causally-linked positive event. Should the event be undone
    /// by rollback, `origin` is sent the anti-event twin.
    pub fn linked(origin: &ActorRef<P>, lvt: VirtualTime, payload: P) -> Self {
        Self { lvt, id: EventId::new(), is_event: true, link: Some(origin.clone()), payload: Payload::Data(payload) }
    }

    /// Stop sentinel. Carries lvt 0 so it sorts ahead of every pending
    /// event; the dispatch priority makes the value otherwise inert.
    pub(crate) fn stop(reason: impl Into<String>) -> Self {
        Self { lvt: 0, id: EventId::new(), is_event: true, link: None, payload: Payload::Stop(reason.into()) }
    }

    /// GVT sentinel announcing `t` as the new lower bound.
    pub(crate) fn gvt_update(t: VirtualTime) -> Self {
        Self { lvt: t, id: EventId::new(), is_event: true, link: None, payload: Payload::GvtUpdate }
    }

    /// The total-order key for the pending-event buffer.
    pub(crate) fn key(&self) -> (VirtualTime, bool, EventId) {
        (self.lvt, self.is_event, self.id)
    }

    /// The application payload, if this is a user event.
    pub fn data(&self) -> Option<&P> {
        match &self.payload {
            Payload::Data(payload) => Some(payload),
            _ => None
        }
    }
}

impl<P: Clone> Event<P> {
    /// The anti-event twin: same id, same lvt, same payload, link cleared,
    /// polarity negative. Idempotent.
    pub fn antievent(&self) -> Event<P> {
        Event { lvt: self.lvt, id: self.id, is_event: false, link: None, payload: self.payload.clone() }
    }
}
