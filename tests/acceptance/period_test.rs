//! Tick period acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - 1000 ticks at 1ms take 1000ms ±20%
//! - After a reset the new period applies to the following ticks
//! - A slow receiver gets the newest tick, not a backlog
//! - A paused ticker starts ticking right after a reset

use super::common::{assert_within, receive_ticks, GENEROUS_TIMEOUT};
use crossbeam_channel::RecvTimeoutError;
use emit_ticker::Ticker;
use std::thread;
use std::time::{Duration, Instant};

const PERIOD: Duration = Duration::from_millis(1);
const TICKS: u32 = 1000;

#[test]
fn test_ticker_period() {
    let ticker = Ticker::new(PERIOD).unwrap();

    let elapsed = receive_ticks(&ticker, TICKS);
    assert_within("1000 ticks of 1ms", elapsed, PERIOD * TICKS);

    ticker.stop();
}

#[test]
fn test_reset_to_faster_period() {
    // Start with a doubled period, then switch to the expected one.
    let ticker = Ticker::new(2 * PERIOD).unwrap();
    ticker.receiver().recv_timeout(GENEROUS_TIMEOUT).unwrap();
    ticker.reset(PERIOD);

    let elapsed = receive_ticks(&ticker, TICKS);
    assert_within("1000 ticks after reset to 1ms", elapsed, PERIOD * TICKS);

    ticker.stop();
}

#[test]
fn test_reset_to_slower_period() {
    let period = Duration::from_millis(20);
    let ticker = Ticker::builder()
        .period(PERIOD)
        .drop_tick_on_reset(true)
        .spawn()
        .unwrap();
    ticker.receiver().recv_timeout(GENEROUS_TIMEOUT).unwrap();
    ticker.reset(period);

    let elapsed = receive_ticks(&ticker, 10);
    assert_within("10 ticks after reset to 20ms", elapsed, period * 10);

    ticker.stop();
}

#[test]
fn test_slow_receiver_gets_latest_tick() {
    let ticker = Ticker::new(PERIOD).unwrap();

    let t0 = ticker.receiver().recv_timeout(GENEROUS_TIMEOUT).unwrap();
    thread::sleep(PERIOD * TICKS);
    let t1 = ticker.receiver().recv_timeout(GENEROUS_TIMEOUT).unwrap();

    // The buffered tick is the newest one, not the one right after t0.
    assert!(t1 > t0);
    assert_within("interval across skipped ticks", t1 - t0, PERIOD * TICKS);

    ticker.stop();
}

#[test]
fn test_paused_ticker_starts_on_reset() {
    let ticker = Ticker::new(Duration::ZERO).unwrap();

    assert_eq!(
        ticker.receiver().recv_timeout(Duration::from_millis(20)),
        Err(RecvTimeoutError::Timeout)
    );

    let start = Instant::now();
    ticker.reset(PERIOD);
    ticker.receiver().recv_timeout(GENEROUS_TIMEOUT).unwrap();
    assert!(
        start.elapsed() < Duration::from_millis(50),
        "first tick after resume took {:?}",
        start.elapsed()
    );

    ticker.stop();
}
