//! Processed-event log
//!
//! Every applied event lands here and stays until fossil collection, because
//! it is the replay source for rollback. Logically the log reads newest
//! first; it is stored oldest first so that appending is cheap and the
//! rollback split is a single `split_off`.

use crate::domain::{
    error::KernelError,
    event::{Event, VirtualTime}
};

/// Applied events, ascending storage, descending log order
#[derive(Debug)]
pub struct PastEvents<P> {
    entries: Vec<Event<P>>
}

impl<P> PastEvents<P> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Record an applied event. Events are applied in ascending lvt order,
    /// so a push behind the newest entry is a kernel bug.
    pub fn push(&mut self, event: Event<P>) -> Result<(), KernelError> {
        if let Some(newest) = self.entries.last() {
            if event.lvt < newest.lvt {
                return Err(KernelError::InvariantViolation(format!(
                    "past event at lvt {} behind newest {}",
                    event.lvt, newest.lvt
                )));
            }
        }
        self.entries.push(event);
        Ok(())
    }

    /// Split the log for a rollback to `t`: removes and returns every event
    /// with `lvt >= t` in ascending order, ready to merge into the pending
    /// buffer. The log keeps exactly the events with `lvt < t`.
    pub fn rollback(&mut self, t: VirtualTime) -> Vec<Event<P>> {
        let split = self.entries.partition_point(|event| event.lvt < t);
        self.entries.split_off(split)
    }

    /// Fossil collection: drop every event older than `t`.
    pub fn truncate_below(&mut self, t: VirtualTime) {
        let split = self.entries.partition_point(|event| event.lvt < t);
        self.entries.drain(..split);
    }

    /// Events in application order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Event<P>> {
        self.entries.iter()
    }

    /// Lvt of the oldest retained event.
    pub fn oldest_lvt(&self) -> Option<VirtualTime> {
        self.entries.first().map(|event| event.lvt)
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
    pub(crate) fn lvts_descending(&self) -> Vec<VirtualTime> {
        self.entries.iter().rev().map(|event| event.lvt).collect()
    }
}

impl<P> Default for PastEvents<P> {
    fn default() -> Self {
        Self::new()
    }
}
