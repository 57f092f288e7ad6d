//! Coalescing mailbox drain
//!
//! Bursts matter: an anti-event frequently arrives on the heels of the
//! straggler it cancels, and seeing both in one batch lets the dispatch
//! loop annihilate them without any simulation work. The drain therefore
//! collects everything available within its initial timeout, then keeps
//! taking whatever is already queued until the channel runs dry.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{Level, event};

use crate::{
    actor::message::Envelope,
    domain::{constant::mailbox, event::Event}
};

/// Receiving half of a TW-actor's transport
pub(crate) struct Mailbox<P> {
    rx: mpsc::UnboundedReceiver<Envelope<P>>
}

impl<P> Mailbox<P> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Envelope<P>>) -> Self {
        Self { rx }
    }

    /// Collect every event that arrives within `initial_timeout`, then
    /// switch to a zero-timeout pass for whatever is already queued. With a
    /// zero timeout and an empty mailbox this returns immediately.
    pub(crate) async fn drain(&mut self, initial_timeout: Duration) -> Vec<Event<P>> {
        let mut batch = Vec::new();

        if !initial_timeout.is_zero() {
            let deadline = tokio::time::Instant::now() + initial_timeout;
            loop {
                match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                    Ok(Some(Envelope::Events(events))) => batch.extend(events),
                    Ok(None) => break,
                    Err(_) => break
                }
            }
        }

        loop {
            match self.rx.try_recv() {
                Ok(Envelope::Events(events)) => batch.extend(events),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break
            }
        }

        if !batch.is_empty() {
            event!(Level::TRACE, event = mailbox::BATCH_DRAINED, count = batch.len());
        }
        batch
    }
}
