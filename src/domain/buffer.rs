//! Pending-event buffer
//!
//! A set-like structure holding future events in ascending
//! `(lvt, is_event, id)` order. Batches are small, so a sorted vector with
//! binary-search insertion beats a tree in practice.

use crate::domain::event::{Event, EventId};

/// Ordered, de-duplicating set of pending events
#[derive(Debug)]
pub struct EventBuffer<P> {
    entries: Vec<Event<P>>
}

impl<P> EventBuffer<P> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert one event, keeping the order. A duplicate delivery (same lvt,
    /// polarity and id) is absorbed silently; returns whether the event was
    /// actually added.
    pub fn insert(&mut self, event: Event<P>) -> bool {
        match self.entries.binary_search_by_key(&event.key(), Event::key) {
            Ok(_) => false,
            Err(position) => {
                self.entries.insert(position, event);
                true
            }
        }
    }

    /// Union with a drained batch or a rollback replay set.
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event<P>>) {
        for event in events {
            self.insert(event);
        }
    }

    /// The next event in virtual-time order, if any.
    pub fn peek(&self) -> Option<&Event<P>> {
        self.entries.first()
    }

    /// Remove and return the head.
    pub fn pop(&mut self) -> Option<Event<P>> {
        if self.entries.is_empty() { None } else { Some(self.entries.remove(0)) }
    }

    /// Drop every entry carrying `id`; returns how many were removed.
    pub fn remove_id(&mut self, id: EventId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|event| event.id != id);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shrink_to_fit(&mut self) {
        self.entries.shrink_to_fit();
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Event<P>> {
        self.entries.iter()
    }
}

impl<P> Default for EventBuffer<P> {
    fn default() -> Self {
        Self::new()
    }
}
