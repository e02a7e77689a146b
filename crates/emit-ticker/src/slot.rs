//! Single-slot tick buffer.
//!
//! Holds at most one pending tick. Offering a new tick evicts the
//! unconsumed one first, so the producer never blocks and a slow
//! consumer only ever sees the newest tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::time::Instant;
use tracing::warn;

/// Producer side of the tick channel.
///
/// Keeps its own receiver so it can evict a stale tick.
#[derive(Debug)]
pub struct TickSlot {
    tx: Sender<Instant>,
    rx: Receiver<Instant>,
}

impl TickSlot {
    /// Create a slot and the consumer receiver it feeds.
    pub fn channel() -> (Self, Receiver<Instant>) {
        let (tx, rx) = bounded(1);
        let slot = Self { tx, rx: rx.clone() };
        (slot, rx)
    }

    /// Replace any pending tick with `tick`. Never blocks.
    pub fn offer(&self, tick: Instant) {
        self.drain();
        // Only this slot sends, so after the drain there is room unless a
        // consumer raced us, in which case the slot is empty anyway.
        if let Err(TrySendError::Full(_)) = self.tx.try_send(tick) {
            warn!("Tick slot unexpectedly full after drain");
        }
    }

    /// Discard the pending tick, returning it if there was one.
    pub fn drain(&self) -> Option<Instant> {
        self.rx.try_recv().ok()
    }

    /// Whether a tick is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Another producer handle for the same channel.
    ///
    /// The channel closes once every sender is gone, so holding this
    /// keeps it open after the slot itself is closed.
    pub fn sender(&self) -> Sender<Instant> {
        self.tx.clone()
    }

    /// Drop the producer side.
    pub fn close(self) {
        drop(self.tx);
    }
}
