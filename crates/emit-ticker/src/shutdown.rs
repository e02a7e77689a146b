//! Coordinated one-shot shutdown.
//!
//! A [`Shutdown`] is shared by any number of threads that want a worker
//! to stop; the worker owns the matching [`ShutdownListener`]. The first
//! request fires the signal, every requester then blocks until the
//! worker acknowledges. Completion is observed as disconnection of the
//! done channel, which also happens if the worker dies without
//! acknowledging, so no requester can hang on a dead worker.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::Once;

/// Create a connected requester/listener pair.
pub fn shutdown() -> (Shutdown, ShutdownListener) {
    let (init_tx, init_rx) = bounded(1);
    let (done_tx, done_rx) = bounded(0);

    let requester = Shutdown {
        init: init_tx,
        once: Once::new(),
        done: done_rx,
    };
    let listener = ShutdownListener {
        init: init_rx,
        done: done_tx,
    };
    (requester, listener)
}

/// Requesting side of a shutdown.
#[derive(Debug)]
pub struct Shutdown {
    init: Sender<()>,
    once: Once,
    done: Receiver<()>,
}

impl Shutdown {
    /// Fire the shutdown signal (only the first call does) and block
    /// until the listener has finished tearing down.
    pub fn request_and_wait(&self) {
        self.once.call_once(|| {
            // A full or disconnected channel means the signal can no
            // longer matter.
            let _ = self.init.try_send(());
        });
        // Nothing is ever sent on `done`; this returns on disconnect.
        let _ = self.done.recv();
    }

    /// Receiver that becomes ready (disconnected) once teardown has
    /// completed. Intended for use in `select!`.
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }

    /// Whether teardown has completed.
    pub fn is_done(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
    }
}

/// Worker side of a shutdown.
#[derive(Debug)]
pub struct ShutdownListener {
    init: Receiver<()>,
    done: Sender<()>,
}

impl ShutdownListener {
    /// Receiver that yields once when shutdown is requested.
    pub fn requested(&self) -> &Receiver<()> {
        &self.init
    }

    /// Signal that teardown is finished, releasing every waiter.
    pub fn acknowledge(self) {
        drop(self.done);
    }
}
