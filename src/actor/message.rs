//! Transport message between TW-actors

use crate::domain::event::Event;

/// What travels through an actor's mailbox. The transport is typed, so
/// nothing but events can ever reach the dispatch loop.
#[derive(Debug, Clone)]
pub(crate) enum Envelope<P> {
    /// One or many events delivered as a single message
    Events(Vec<Event<P>>)
}
