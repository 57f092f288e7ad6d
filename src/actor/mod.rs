//! Actor runtime
//!
//! One tokio task per TW-actor: the mailbox drains the transport, the shim
//! fences user code, the kernel runs the dispatch loop and the handle is
//! what the rest of the world holds.

pub mod handle;

pub(crate) mod kernel;
pub(crate) mod mailbox;
pub(crate) mod message;
pub(crate) mod shim;

pub use handle::*;
