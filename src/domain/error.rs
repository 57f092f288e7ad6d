use thiserror::Error;

/// Common error types for the kernel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Behavior `init` returned an error or panicked; the actor never starts
    #[error("{0}")]
    InitFailure(String),

    /// Behavior `handle_event` returned an error or a callback panicked
    #[error("{0}")]
    HandlerFailure(String),

    /// Kernel-internal invariant breach; always a bug, never recoverable
    #[error("{0}")]
    InvariantViolation(String),

    /// The target actor's mailbox is gone
    #[error("{0}")]
    MailboxClosed(String)
}

/// Terminal outcome of a TW-actor, observable through an `ExitMonitor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// A stop event reached the head of the queue
    Stopped(String),
    /// The actor aborted
    Failed(KernelError),
    /// The actor vanished without reporting an exit
    Disconnected
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Stopped(reason) => write!(f, "stopped: {reason}"),
            ExitReason::Failed(error) => write!(f, "failed: {error}"),
            ExitReason::Disconnected => write!(f, "disconnected")
        }
    }
}
