// src/session/clock.rs

use std::future;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use crate::config::DEFAULT_TICK_INTERVAL_MS;

/// What a single tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// One second was taken off; time is still left.
    Ticked(u32),
    /// The countdown just reached zero. Fired once per clock.
    Expired,
    /// The clock is stopped or already expired; nothing changed.
    Idle,
}

/// Countdown for one session.
///
/// Owns its own ticker: `start` schedules it, `stop` drops it, and `dispose`
/// drops it for good. Dropping the clock releases the ticker on every path.
#[derive(Debug)]
pub struct SessionClock {
    remaining: u32,
    period: Duration,
    ticker: Option<Interval>,
    expired: bool,
    disposed: bool,
}

impl SessionClock {
    /// A zero `period` is replaced by the default tick interval.
    pub fn new(seconds: u32, period: Duration) -> Self {
        let period = if period.is_zero() {
            Duration::from_millis(DEFAULT_TICK_INTERVAL_MS)
        } else {
            period
        };
        Self {
            remaining: seconds,
            period,
            ticker: None,
            expired: seconds == 0,
            disposed: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Starts (or resumes) ticking. The first tick lands one full period from now,
    /// so a resume never charges the time spent paused.
    pub fn start(&mut self) {
        if self.ticker.is_some() || self.expired || self.disposed {
            return;
        }
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    /// Suspends ticking and keeps the remaining time.
    pub fn stop(&mut self) {
        self.ticker = None;
    }

    /// Stops permanently. A disposed clock can never be restarted.
    pub fn dispose(&mut self) {
        self.ticker = None;
        self.disposed = true;
    }

    /// Takes one second off the countdown.
    pub fn advance(&mut self) -> ClockEvent {
        if self.expired || self.disposed {
            return ClockEvent::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            self.ticker = None;
            ClockEvent::Expired
        } else {
            ClockEvent::Ticked(self.remaining)
        }
    }

    /// Waits for the next scheduled tick and applies it.
    ///
    /// Never resolves while the clock is stopped, which lets callers use it as
    /// one branch of a `select!` unconditionally.
    pub async fn tick(&mut self) -> ClockEvent {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
                self.advance()
            }
            None => future::pending().await,
        }
    }
}
