//! Clock sources — elapsed real time consumed by the scheduler.
//!
//! RULE: The scheduler never reads the system clock directly.
//! It polls a ClockSource once per update for the seconds elapsed
//! since the previous poll. A stopped clock accrues no time.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

pub trait ClockSource {
    /// Seconds elapsed since the previous poll (or since `start`).
    /// Always 0.0 while stopped.
    fn delta(&mut self) -> f64;

    /// Restart timing from now. Time before this call is discarded.
    fn start(&mut self);

    /// Stop timing. Nothing accrues until the next `start`.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// Monotonic wall clock for interactive sessions.
#[derive(Debug)]
pub struct WallClock {
    last:    Instant,
    running: bool,
}

impl WallClock {
    pub fn new() -> Self {
        Self { last: Instant::now(), running: true }
    }
}

impl Default for WallClock {
    fn default() -> Self { Self::new() }
}

impl ClockSource for WallClock {
    fn delta(&mut self) -> f64 {
        if !self.running {
            return 0.0;
        }
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        elapsed
    }

    fn start(&mut self) {
        self.last = Instant::now();
        self.running = true;
    }

    fn stop(&mut self) { self.running = false; }

    fn is_running(&self) -> bool { self.running }
}

/// Hand-fed clock for tests and the headless runner.
///
/// Clones share the same pending time, so the host keeps one handle
/// and gives the other to the scheduler.
#[derive(Debug, Clone)]
pub struct ManualClock {
    pending: Rc<Cell<f64>>,
    running: Rc<Cell<bool>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            pending: Rc::new(Cell::new(0.0)),
            running: Rc::new(Cell::new(true)),
        }
    }

    /// Bank `seconds` of real time for the next poll.
    /// Ignored while the clock is stopped.
    pub fn advance(&self, seconds: f64) {
        if self.running.get() {
            self.pending.set(self.pending.get() + seconds);
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self { Self::new() }
}

impl ClockSource for ManualClock {
    fn delta(&mut self) -> f64 {
        if !self.running.get() {
            return 0.0;
        }
        self.pending.replace(0.0)
    }

    fn start(&mut self) {
        self.pending.set(0.0);
        self.running.set(true);
    }

    fn stop(&mut self) {
        self.pending.set(0.0);
        self.running.set(false);
    }

    fn is_running(&self) -> bool { self.running.get() }
}
