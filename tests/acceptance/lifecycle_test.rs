//! Pause, stop, and tick-dropping acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - A paused ticker delivers nothing until it is reset
//! - Nothing is delivered after stop returns
//! - With close-on-stop the channel reports closed immediately
//! - Unconsumed ticks are dropped or kept on reset/stop as configured
//! - Stop is idempotent, also across threads

use super::common::{wait_for_pending, GENEROUS_TIMEOUT};
use crossbeam_channel::{RecvTimeoutError, TryRecvError};
use emit_common::config::TickerConfig;
use emit_ticker::Ticker;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const PERIOD: Duration = Duration::from_millis(1);
/// Long enough that no new tick arrives while a test inspects the channel.
const SLOW_PERIOD: Duration = Duration::from_millis(500);
const QUIET: Duration = Duration::from_millis(20);

fn ticker_with(config: TickerConfig) -> Ticker {
    Ticker::with_config(PERIOD, config).unwrap()
}

#[test]
fn test_pause_and_resume() {
    let ticker = Ticker::new(PERIOD).unwrap();
    ticker.receiver().recv_timeout(GENEROUS_TIMEOUT).unwrap();

    ticker.reset(Duration::ZERO);
    // A tick from before the pause may still be buffered.
    let _ = ticker.receiver().try_recv();
    assert_eq!(
        ticker.receiver().recv_timeout(QUIET),
        Err(RecvTimeoutError::Timeout)
    );

    ticker.reset(PERIOD);
    ticker.receiver().recv_timeout(GENEROUS_TIMEOUT).unwrap();

    ticker.stop();
}

#[test]
fn test_no_ticks_after_stop() {
    let ticker = Ticker::new(PERIOD).unwrap();
    ticker.receiver().recv_timeout(GENEROUS_TIMEOUT).unwrap();

    ticker.stop();
    assert!(ticker.is_stopped());

    // At most the tick buffered before stop remains.
    let _ = ticker.receiver().try_recv();
    assert_eq!(
        ticker.receiver().recv_timeout(QUIET),
        Err(RecvTimeoutError::Timeout)
    );
}

#[test]
fn test_close_on_stop() {
    let ticker = ticker_with(TickerConfig {
        close_on_stop: true,
        drop_tick_on_stop: true,
        ..Default::default()
    });
    ticker.receiver().recv_timeout(GENEROUS_TIMEOUT).unwrap();

    ticker.stop();
    assert_eq!(
        ticker.receiver().recv_timeout(GENEROUS_TIMEOUT),
        Err(RecvTimeoutError::Disconnected)
    );
}

#[test]
fn test_iteration_ends_on_stop() {
    let ticker = Arc::new(ticker_with(TickerConfig {
        close_on_stop: true,
        ..Default::default()
    }));

    let consumer = {
        let rx = ticker.receiver().clone();
        thread::spawn(move || rx.iter().count())
    };

    thread::sleep(QUIET);
    ticker.stop();

    let received = consumer.join().unwrap();
    assert!(received > 0);
}

#[test]
fn test_drop_tick_on_reset() {
    let ticker = ticker_with(TickerConfig {
        drop_tick_on_reset: true,
        ..Default::default()
    });

    wait_for_pending(&ticker);
    ticker.reset(SLOW_PERIOD);

    assert_eq!(ticker.receiver().try_recv(), Err(TryRecvError::Empty));
    ticker.stop();
}

#[test]
fn test_keep_tick_on_reset() {
    let ticker = ticker_with(TickerConfig::default());

    wait_for_pending(&ticker);
    ticker.reset(SLOW_PERIOD);

    assert!(ticker.receiver().try_recv().is_ok());
    ticker.stop();
}

#[test]
fn test_drop_tick_on_stop() {
    let ticker = ticker_with(TickerConfig {
        drop_tick_on_stop: true,
        ..Default::default()
    });

    wait_for_pending(&ticker);
    ticker.stop();

    assert_eq!(ticker.receiver().try_recv(), Err(TryRecvError::Empty));
}

#[test]
fn test_keep_tick_on_stop() {
    let ticker = ticker_with(TickerConfig::default());

    wait_for_pending(&ticker);
    ticker.stop();

    assert!(ticker.receiver().try_recv().is_ok());
}

#[test]
fn test_stop_twice() {
    let ticker = Ticker::new(PERIOD).unwrap();
    ticker.stop();
    ticker.stop();
    assert!(ticker.is_stopped());
}

#[test]
fn test_concurrent_stop_with_resets() {
    let ticker = Arc::new(ticker_with(TickerConfig {
        close_on_stop: true,
        ..Default::default()
    }));

    let resetters: Vec<_> = (1..=4u32)
        .map(|i| {
            let ticker = Arc::clone(&ticker);
            thread::spawn(move || {
                for _ in 0..100 {
                    ticker.reset(PERIOD * i);
                }
            })
        })
        .collect();

    let stoppers: Vec<_> = (0..4)
        .map(|_| {
            let ticker = Arc::clone(&ticker);
            thread::spawn(move || ticker.stop())
        })
        .collect();

    for handle in resetters.into_iter().chain(stoppers) {
        handle.join().unwrap();
    }

    assert!(ticker.is_stopped());
    let remaining = ticker.receiver().iter().count();
    assert!(remaining <= 1);
}
