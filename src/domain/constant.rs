//! Structured log events for internal monitoring and debugging

/// Actor lifecycle events
pub mod lifecycle {
    pub const ACTOR_SPAWNED: &str = "actor.spawned";
    pub const ACTOR_STOPPED: &str = "actor.stopped";
    pub const ACTOR_FAILED: &str = "actor.failed";
    pub const INIT_FAILED: &str = "init.failed";
    pub const TERMINATE_FAILED: &str = "terminate.failed";
}

/// Dispatch loop events
pub mod dispatch {
    pub const EVENT_APPLIED: &str = "event.applied";
    pub const TICK_ADVANCED: &str = "tick.advanced";
    pub const STRAGGLER_DETECTED: &str = "straggler.detected";
    pub const ROLLBACK_COMPLETED: &str = "rollback.completed";
    pub const ANTIEVENT_ANNIHILATED: &str = "antievent.annihilated";
    pub const ANTIEVENT_EMITTED: &str = "antievent.emitted";
    pub const ANTIEVENT_SEND_FAILED: &str = "antievent.send_failed";
    pub const HANDLER_FAILED: &str = "handler.failed";
}

/// Fossil collection events
pub mod fossil {
    pub const GVT_COLLECTED: &str = "gvt.collected";
    pub const GVT_STALE: &str = "gvt.stale";
    pub const GVT_AHEAD: &str = "gvt.ahead";
}

/// Mailbox events
pub mod mailbox {
    pub const BATCH_DRAINED: &str = "batch.drained";
}
