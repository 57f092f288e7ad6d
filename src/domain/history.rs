//! Saved-state history
//!
//! Snapshots of the user state, newest first. The head is always the
//! actor's current state; older entries exist solely so rollback has a
//! base to restore, and fossil collection is the only path that releases
//! them. The split between `head` and `tail` makes non-emptiness a
//! structural guarantee rather than a runtime check.

use std::collections::VecDeque;

use crate::domain::{
    error::KernelError,
    event::VirtualTime
};

/// State snapshots in strictly descending lvt order, never empty
#[derive(Debug)]
pub struct StateHistory<S> {
    head: (VirtualTime, S),
    tail: VecDeque<(VirtualTime, S)>
}

impl<S> StateHistory<S> {
    pub fn new(lvt: VirtualTime, state: S) -> Self {
        Self { head: (lvt, state), tail: VecDeque::new() }
    }

    /// Record a new snapshot.
    ///
    /// Same lvt as the head replaces it (a same-tick state update); a newer
    /// lvt pushes the head down; an older lvt is a kernel bug.
    pub fn append(&mut self, lvt: VirtualTime, state: S) -> Result<(), KernelError> {
        if lvt == self.head.0 {
            self.head = (lvt, state);
            return Ok(());
        }
        if lvt < self.head.0 {
            return Err(KernelError::InvariantViolation(format!(
                "state append at lvt {lvt} behind history head {}",
                self.head.0
            )));
        }
        let previous = std::mem::replace(&mut self.head, (lvt, state));
        self.tail.push_front(previous);
        Ok(())
    }

    /// Drop every snapshot older than `t`. The head never qualifies while
    /// the caller upholds `current lvt >= t`.
    pub fn truncate_below(&mut self, t: VirtualTime) {
        while self.tail.back().is_some_and(|(lvt, _)| *lvt < t) {
            self.tail.pop_back();
        }
    }

    /// Rewind for a rollback to `t`: drop snapshots at or after `t`, so the
    /// restored head predates every event about to be replayed. The oldest
    /// snapshot is never dropped.
    pub fn truncate_from(&mut self, t: VirtualTime) {
        while self.head.0 >= t {
            match self.tail.pop_front() {
                Some(previous) => self.head = previous,
                None => break
            }
        }
    }

    /// Current snapshot.
    pub fn head(&self) -> (VirtualTime, &S) {
        (self.head.0, &self.head.1)
    }

    /// Current state.
    pub fn head_state(&self) -> &S {
        &self.head.1
    }

    /// Lvt of the oldest retained snapshot.
    pub fn oldest_lvt(&self) -> VirtualTime {
        self.tail.back().map_or(self.head.0, |(lvt, _)| *lvt)
    }

    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn shrink_to_fit(&mut self) {
        self.tail.shrink_to_fit();
    }

    #[cfg(test)]
    pub(crate) fn lvts(&self) -> Vec<VirtualTime> {
        std::iter::once(self.head.0).chain(self.tail.iter().map(|(lvt, _)| *lvt)).collect()
    }
}
