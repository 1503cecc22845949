//! Elapsed-time sources for the frame loop.

use std::time::Instant;

/// Something the frame loop can read time from.
pub trait FrameClock {
    /// Step the clock and return the elapsed seconds since it started.
    fn advance(&mut self) -> f64;

    /// Elapsed seconds as of the last [`advance`](Self::advance).
    fn elapsed(&self) -> f64;
}

/// Wall-clock timer.
///
/// Elapsed time accumulates per-tick deltas, so it never decreases and is
/// never reset while the timer lives.
#[derive(Debug, Clone)]
pub struct Timer {
    previous: Instant,
    delta: f64,
    elapsed: f64,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            previous: Instant::now(),
            delta: 0.0,
            elapsed: 0.0,
        }
    }

    /// Seconds between the last two advances.
    pub fn delta(&self) -> f64 {
        self.delta
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for Timer {
    fn advance(&mut self) -> f64 {
        let now = Instant::now();
        self.delta = now.saturating_duration_since(self.previous).as_secs_f64();
        self.previous = now;
        self.elapsed += self.delta;
        self.elapsed
    }

    fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// A clock that moves by a fixed step per advance.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualClock {
    pub step: f64,
    elapsed: f64,
}

impl ManualClock {
    /// Negative steps are treated as zero.
    pub fn new(step: f64) -> Self {
        Self {
            step: step.max(0.0),
            elapsed: 0.0,
        }
    }
}

impl FrameClock for ManualClock {
    fn advance(&mut self) -> f64 {
        self.elapsed += self.step;
        self.elapsed
    }

    fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_starts_at_zero() {
        let timer = Timer::new();
        assert_eq!(timer.elapsed(), 0.0);
        assert_eq!(timer.delta(), 0.0);
    }

    #[test]
    fn test_timer_is_monotonic() {
        let mut timer = Timer::new();
        let mut last = 0.0;
        for _ in 0..100 {
            let now = timer.advance();
            assert!(now >= last);
            assert!(timer.delta() >= 0.0);
            last = now;
        }
        assert_eq!(timer.elapsed(), last);
    }

    #[test]
    fn test_timer_tracks_sleep() {
        let mut timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let elapsed = timer.advance();
        assert!(elapsed >= 0.015, "elapsed {elapsed}");
    }

    #[test]
    fn test_manual_clock_steps() {
        let mut clock = ManualClock::new(0.5);
        assert_eq!(clock.advance(), 0.5);
        assert_eq!(clock.advance(), 1.0);
        assert_eq!(clock.elapsed(), 1.0);
    }

    #[test]
    fn test_manual_clock_rejects_negative_step() {
        let mut clock = ManualClock::new(-1.0);
        assert_eq!(clock.advance(), 0.0);
    }
}
