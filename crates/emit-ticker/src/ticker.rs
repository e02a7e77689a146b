//! Resettable, drop-tolerant periodic ticker.
//!
//! Behaves like a plain interval timer delivering [`Instant`]s on a
//! channel, with two differences:
//!
//! - The period can be changed at runtime with [`Ticker::reset`] without
//!   replacing the ticker or its channel. A zero period pauses it.
//! - Slow receivers never cause a backlog. The channel holds at most one
//!   tick and a new tick replaces an unconsumed one, so a receiver only
//!   ever sees the latest tick.
//!
//! All state lives on a dedicated control-loop thread. The handle talks
//! to it over channels only:
//!
//! ```text
//!   reset(d) ──► commands ─┐
//!   stop()   ──► shutdown ─┼─► control loop ──► slot ──► receiver()
//!   clock    ──► fires ────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use emit_ticker::Ticker;
//! use std::time::Duration;
//!
//! let ticker = Ticker::new(Duration::from_millis(100))?;
//! ticker.receiver().recv().ok();
//!
//! ticker.reset(Duration::from_millis(10));
//! ticker.receiver().recv().ok();
//!
//! ticker.stop();
//! # Ok::<(), emit_common::EmitError>(())
//! ```

use crate::clock::{ClockSource, SystemClock};
use crate::shutdown::{shutdown, Shutdown, ShutdownListener};
use crate::slot::TickSlot;
use crossbeam_channel::{bounded, never, select, Receiver, Sender};
use crossbeam_utils::sync::WaitGroup;
use emit_common::config::TickerConfig;
use emit_common::error::{EmitError, EmitResult};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Handle to a running ticker.
///
/// Dropping the handle stops the ticker.
#[derive(Debug)]
pub struct Ticker {
    /// Consumer end of the tick slot.
    rx: Receiver<Instant>,
    /// Switches the ticker was built with.
    config: TickerConfig,
    /// One-shot stop coordination with the control loop.
    shutdown: Shutdown,
    /// Rendezvous channel for period changes.
    commands: Sender<ResetCommand>,
    /// Keeps the tick channel open after stop unless `close_on_stop` is set.
    _retained: Option<Sender<Instant>>,
    /// Control-loop thread, joined on drop.
    handle: Option<JoinHandle<()>>,
}

/// Period change request, acknowledged by dropping `done`.
#[derive(Debug)]
struct ResetCommand {
    period: Duration,
    done: WaitGroup,
}

impl Ticker {
    /// Start a ticker with default configuration on the system clock.
    ///
    /// A zero period creates a paused ticker that can be started later
    /// with [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::Spawn`] if the control-loop thread cannot be
    /// started.
    pub fn new(period: Duration) -> EmitResult<Self> {
        TickerBuilder::new().period(period).spawn()
    }

    /// Start a ticker with the given configuration on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::Spawn`] if the control-loop thread cannot be
    /// started.
    pub fn with_config(period: Duration, config: TickerConfig) -> EmitResult<Self> {
        TickerBuilder::new().period(period).config(config).spawn()
    }

    /// Create a builder for a customized ticker.
    pub fn builder() -> TickerBuilder {
        TickerBuilder::new()
    }

    /// The channel ticks are delivered on.
    ///
    /// It holds at most one tick. The receiver may be cloned; each tick
    /// goes to only one of the clones.
    #[inline]
    pub fn receiver(&self) -> &Receiver<Instant> {
        &self.rx
    }

    /// The configuration the ticker was built with.
    pub fn config(&self) -> TickerConfig {
        self.config
    }

    /// Change the tick period, keeping the same ticker and channel.
    ///
    /// Blocks until the new period is in effect. A zero period pauses the
    /// ticker. On a stopped ticker this is a no-op; when racing a
    /// concurrent [`stop`](Self::stop) the reset is either fully applied
    /// or skipped.
    pub fn reset(&self, period: Duration) {
        let done = WaitGroup::new();
        let command = ResetCommand {
            period,
            done: done.clone(),
        };

        select! {
            recv(self.shutdown.done()) -> _ => {}
            send(self.commands, command) -> res => {
                if res.is_ok() {
                    done.wait();
                }
            }
        }
    }

    /// Stop the ticker. No ticks are sent after this returns.
    ///
    /// Blocks until teardown is complete. Safe to call repeatedly and from
    /// several threads at once; every caller returns after the single
    /// teardown has finished. The channel is closed only if the ticker was
    /// built with `close_on_stop`.
    pub fn stop(&self) {
        self.shutdown.request_and_wait();
    }

    /// Whether the ticker has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_done()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.join() {
                warn!("Ticker thread panicked: {:?}", e);
            }
        }
    }
}

/// Builder for configuring a ticker.
#[derive(Debug)]
pub struct TickerBuilder<C: ClockSource = SystemClock> {
    period: Duration,
    config: TickerConfig,
    clock: C,
}

impl Default for TickerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TickerBuilder {
    /// Create a builder for a paused ticker with default configuration on
    /// the system clock.
    pub fn new() -> Self {
        Self {
            period: Duration::ZERO,
            config: TickerConfig::default(),
            clock: SystemClock,
        }
    }
}

impl<C: ClockSource> TickerBuilder<C> {
    /// Set the initial period. Zero starts the ticker paused.
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Set the full ticker configuration.
    pub fn config(mut self, config: TickerConfig) -> Self {
        self.config = config;
        self
    }

    /// Close the channel on stop.
    pub fn close_on_stop(mut self, enabled: bool) -> Self {
        self.config.close_on_stop = enabled;
        self
    }

    /// Discard an unconsumed tick on reset.
    pub fn drop_tick_on_reset(mut self, enabled: bool) -> Self {
        self.config.drop_tick_on_reset = enabled;
        self
    }

    /// Discard an unconsumed tick on stop.
    pub fn drop_tick_on_stop(mut self, enabled: bool) -> Self {
        self.config.drop_tick_on_stop = enabled;
        self
    }

    /// Use a different underlying clock source.
    pub fn clock<D: ClockSource>(self, clock: D) -> TickerBuilder<D> {
        TickerBuilder {
            period: self.period,
            config: self.config,
            clock,
        }
    }

    /// Start the clock and the control loop.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::Spawn`] if the control-loop thread cannot be
    /// started.
    pub fn spawn(self) -> EmitResult<Ticker> {
        let config = self.config;
        let (slot, rx) = TickSlot::channel();
        let retained = (!config.close_on_stop).then(|| slot.sender());
        let (requester, listener) = shutdown();
        let (commands_tx, commands_rx) = bounded(0);

        let mut control = ControlLoop {
            config,
            source: self.clock,
            clock: None,
            period: Duration::ZERO,
            slot,
            commands: commands_rx,
            shutdown: listener,
        };
        control.set_period(self.period);

        debug!(period = ?self.period, ?config, "Starting ticker");

        let handle = thread::Builder::new()
            .name("emit-ticker".into())
            .spawn(move || control.run())
            .map_err(|e| EmitError::Spawn(e.to_string()))?;

        Ok(Ticker {
            rx,
            config,
            shutdown: requester,
            commands: commands_tx,
            _retained: retained,
            handle: Some(handle),
        })
    }
}

/// What woke the control loop.
enum Event {
    Stop,
    Reset(ResetCommand),
    Fired(Instant),
    ClockLost,
}

/// State owned by the control-loop thread.
///
/// The ticker is active while `clock` is `Some` and paused while it is
/// `None`; `clock` is `Some` exactly when `period` is non-zero.
struct ControlLoop<C: ClockSource> {
    config: TickerConfig,
    source: C,
    clock: Option<Receiver<Instant>>,
    period: Duration,
    slot: TickSlot,
    commands: Receiver<ResetCommand>,
    shutdown: ShutdownListener,
}

impl<C: ClockSource> ControlLoop<C> {
    fn run(mut self) {
        debug!(period = ?self.period, "Ticker control loop started");

        loop {
            match self.next_event() {
                Event::Stop => break,
                Event::Reset(command) => self.handle_reset(command),
                Event::Fired(tick) => {
                    trace!(period = ?self.period, "Tick");
                    self.slot.offer(tick);
                }
                Event::ClockLost => {
                    warn!(period = ?self.period, "Clock source disconnected, pausing ticker");
                    self.set_period(Duration::ZERO);
                }
            }
        }

        self.handle_stop();
    }

    /// Block until the next stop request, reset command, or clock fire.
    fn next_event(&self) -> Event {
        // Fast path so a stream of resets and fires cannot delay a stop.
        if self.shutdown.requested().try_recv().is_ok() {
            return Event::Stop;
        }

        let paused = never();
        let clock = self.clock.as_ref().unwrap_or(&paused);

        select! {
            recv(self.shutdown.requested()) -> _ => Event::Stop,
            recv(self.commands) -> command => match command {
                Ok(command) => Event::Reset(command),
                Err(_) => Event::Stop,
            },
            recv(clock) -> tick => match tick {
                Ok(tick) => Event::Fired(tick),
                Err(_) => Event::ClockLost,
            },
        }
    }

    fn handle_reset(&mut self, command: ResetCommand) {
        if self.config.drop_tick_on_reset {
            self.slot.drain();
        }

        debug!(from = ?self.period, to = ?command.period, "Ticker reset");
        self.set_period(command.period);

        drop(command.done);
    }

    fn handle_stop(self) {
        let ControlLoop {
            config,
            clock,
            slot,
            shutdown,
            ..
        } = self;

        if config.drop_tick_on_stop {
            slot.drain();
        }
        let pending = slot.is_pending();
        // The handle retains a sender unless `close_on_stop` is set, so
        // this only closes the channel when asked to.
        slot.close();
        drop(clock);

        debug!(pending, "Ticker stopped");
        shutdown.acknowledge();
    }

    /// Replace the underlying clock. The old clock is released before a
    /// new one starts.
    fn set_period(&mut self, period: Duration) {
        self.clock = None;
        self.period = period;
        if !period.is_zero() {
            self.clock = Some(self.source.start(period));
        }
    }
}
