//! Module for the broadcast cancellation signal shared by every task of a run.
//!
//! The signal is a channel which never carries a message. Dropping its only sender
//! disconnects every receiver at once, which makes the receivers ready inside a
//! `select!` and lets a blocked send or receive give up.

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, select};
use tracing::debug;

/// Uninhabited: nothing is ever sent over the signal channel.
#[derive(Debug)]
pub(crate) enum Never {}

/// Owner of a cancellation signal. There is exactly one per signal and tripping it
/// consumes it, so the signal can only be raised once.
/// Dropping an untripped breaker raises the signal as well.
#[derive(Debug)]
pub struct Breaker {
    _trigger: Sender<Never>,
    signal: Cancellation,
}

impl Breaker {
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            _trigger: trigger,
            signal: Cancellation { signal },
        }
    }

    /// Returns an observer of this breaker which can be handed to any number of tasks.
    pub fn cancellation(&self) -> Cancellation {
        self.signal.clone()
    }

    /// Raises the signal. Every task observing it abandons its pending send or receive.
    pub fn trip(self) {
        debug!("breaker tripped");
    }
}

impl Default for Breaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a [`Breaker`].
#[derive(Debug, Clone)]
pub struct Cancellation {
    signal: Receiver<Never>,
}

impl Cancellation {
    /// An observer which is never cancelled.
    pub fn never() -> Self {
        Self {
            signal: crossbeam_channel::never(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// For use as a `recv` arm of a `select!`. It becomes ready once the breaker is tripped.
    pub(crate) fn signal(&self) -> &Receiver<Never> {
        &self.signal
    }

    /// Sends `item` unless the breaker is tripped first.
    /// Returns `false` if the item was not delivered, either because of cancellation or
    /// because the receiving side is gone.
    pub(crate) fn send<T>(&self, sender: &Sender<T>, item: T) -> bool {
        // select! picks randomly among ready operations, so a tripped breaker is checked up front
        if self.is_cancelled() {
            return false;
        }
        select! {
            send(sender, item) -> res => res.is_ok(),
            recv(self.signal) -> _ => false,
        }
    }

    /// Receives the next item unless the breaker is tripped first.
    /// Returns `None` on cancellation or once the channel is closed and drained.
    pub(crate) fn recv<T>(&self, receiver: &Receiver<T>) -> Option<T> {
        if self.is_cancelled() {
            return None;
        }
        select! {
            recv(receiver) -> msg => msg.ok(),
            recv(self.signal) -> _ => None,
        }
    }
}
