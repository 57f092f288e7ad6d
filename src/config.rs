//! Kernel tuning knobs

use std::time::Duration;

/// Runtime configuration for a TW-actor
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Initial mailbox-drain timeout used when the event buffer is empty.
    /// Zero polls without blocking, leaving idle pacing entirely to the
    /// behavior's `tick_tock`; a non-zero value parks the actor between
    /// bursts.
    pub drain_timeout:     Duration,
    /// Release excess store capacity after each fossil collection
    pub compact_on_fossil: bool
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self { drain_timeout: Duration::ZERO, compact_on_fossil: true }
    }
}

impl KernelConfig {
    /// Creates a config that parks the actor for `timeout` when idle
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Toggles allocation compaction at fossil-collection time
    pub fn with_compact_on_fossil(mut self, compact: bool) -> Self {
        self.compact_on_fossil = compact;
        self
    }
}
