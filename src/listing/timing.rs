//! Search debounce and auto-refresh timers
//!
//! Both take the current instant as an argument so the event loop decides when
//! to poll them.

use std::time::{Duration, Instant};

/// Single-deadline debounce: every input pushes the deadline back
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn input(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True once, when the quiet period has elapsed
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Fixed-interval refresh that skips ticks while a request is running
#[derive(Debug, Clone)]
pub struct AutoRefresh {
    interval: Duration,
    next_due: Instant,
    in_flight: bool,
    skipped: u64,
}

impl AutoRefresh {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
            in_flight: false,
            skipped: 0,
        }
    }

    /// Whether a refresh should start now
    pub fn due(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        if self.in_flight {
            self.skipped += 1;
            return false;
        }
        true
    }

    pub fn begin(&mut self) {
        self.in_flight = true;
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Ticks dropped because a request was still running
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_resets_on_each_input() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.input(start);
        debouncer.input(start + Duration::from_millis(300));
        assert!(!debouncer.fire(start + Duration::from_millis(600)));
        assert!(debouncer.fire(start + Duration::from_millis(800)));
        assert!(!debouncer.fire(start + Duration::from_millis(900)));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_debounce_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.input(start);
        debouncer.cancel();
        assert!(!debouncer.fire(start + Duration::from_secs(1)));
    }

    #[test]
    fn test_auto_refresh_skips_while_in_flight() {
        let start = Instant::now();
        let mut refresh = AutoRefresh::new(Duration::from_secs(30), start);

        assert!(!refresh.due(start + Duration::from_secs(10)));
        assert!(refresh.due(start + Duration::from_secs(30)));

        refresh.begin();
        assert!(!refresh.due(start + Duration::from_secs(60)));
        assert_eq!(refresh.skipped(), 1);

        refresh.finish();
        assert!(!refresh.due(start + Duration::from_secs(70)));
        assert!(refresh.due(start + Duration::from_secs(90)));
    }
}
