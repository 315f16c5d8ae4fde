//! Outgoing message sink.

use std::collections::VecDeque;

use codesync_common::ClientMessage;

/// Where the controller hands messages bound for the authority.
///
/// Implementations must preserve call order; the authority relies on
/// per-client FIFO delivery.
pub trait Outbox {
    fn send(&mut self, message: ClientMessage);
}

impl Outbox for Vec<ClientMessage> {
    fn send(&mut self, message: ClientMessage) {
        self.push(message);
    }
}

/// Queue drained by the owner after each controller call.
#[derive(Debug, Default)]
pub struct QueuedOutbox {
    queue: VecDeque<ClientMessage>,
}

impl QueuedOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = ClientMessage> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Outbox for QueuedOutbox {
    fn send(&mut self, message: ClientMessage) {
        self.queue.push_back(message);
    }
}
