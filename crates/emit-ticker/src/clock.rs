//! Underlying periodic clock sources.
//!
//! A clock is started with a non-zero period and delivers fire times on
//! a crossbeam receiver. Dropping the receiver stops the clock, so a
//! ticker releases its clock simply by letting go of the receiver.
//!
//! - [`SystemClock`]: monotonic clock backed by `crossbeam_channel::tick`
//! - [`ManualClock`]: hand-driven clock for deterministic tests

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Source of periodic wakeups.
pub trait ClockSource: Send + 'static {
    /// Start a new clock firing every `period`.
    ///
    /// `period` is never zero. The returned receiver yields one instant
    /// per fire; dropping it stops the clock.
    fn start(&self, period: Duration) -> Receiver<Instant>;
}

/// Monotonic system clock.
///
/// Fire times are scheduled relative to the start, so the clock does not
/// drift. Fires the receiver is too slow to take are dropped by the
/// clock itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn start(&self, period: Duration) -> Receiver<Instant> {
        crossbeam_channel::tick(period)
    }
}

/// Clock that fires only when told to.
///
/// Clones share state, so a test keeps one clone and hands the other to
/// the ticker.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualClockState>>,
}

#[derive(Debug, Default)]
struct ManualClockState {
    /// Sender of the most recently started clock.
    current: Option<Sender<Instant>>,
    /// Every period passed to `start`, oldest first.
    started: Vec<Duration>,
}

impl ManualClock {
    /// Create a clock that has not been started yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the most recently started clock with the current instant.
    ///
    /// Returns `false` if no clock was started or the started clock has
    /// since been stopped. A fire that finds the previous one still
    /// unconsumed is dropped, as the system clock does, and still counts
    /// as delivered to a live clock.
    pub fn fire(&self) -> bool {
        let state = self.lock();
        match &state.current {
            Some(tx) => !matches!(
                tx.try_send(Instant::now()),
                Err(TrySendError::Disconnected(_))
            ),
            None => false,
        }
    }

    /// Periods of every clock started so far, oldest first.
    pub fn started_periods(&self) -> Vec<Duration> {
        self.lock().started.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ManualClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClockSource for ManualClock {
    fn start(&self, period: Duration) -> Receiver<Instant> {
        let (tx, rx) = bounded(1);
        let mut state = self.lock();
        state.current = Some(tx);
        state.started.push(period);
        rx
    }
}
