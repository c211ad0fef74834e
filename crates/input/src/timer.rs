use std::time::{Duration, Instant};

/// Fixed-rate repeat timer driven by the host's clock.
///
/// The timer owns no thread. The host asks for the next deadline, sleeps
/// until then, and calls [`RepeatTimer::poll`].
#[derive(Debug, Clone)]
pub struct RepeatTimer {
    period: Duration,
    next_fire: Option<Instant>,
}

impl RepeatTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_fire: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the timer. The first fire is one period after `now`.
    /// Returns `false` (and changes nothing) when already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.next_fire.is_some() {
            return false;
        }
        self.next_fire = Some(now + self.period);
        true
    }

    /// Cancel the timer. Returns whether it was running.
    pub fn stop(&mut self) -> bool {
        self.next_fire.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.next_fire.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next_fire
    }

    /// Fire at most once if the deadline has passed. Missed periods are
    /// dropped rather than replayed in a burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_fire {
            Some(due) if now >= due => {
                let mut next = due + self.period;
                if next <= now {
                    next = now + self.period;
                }
                self.next_fire = Some(next);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(20);

    #[test]
    fn start_is_idempotent() {
        let t0 = Instant::now();
        let mut timer = RepeatTimer::new(PERIOD);
        assert!(timer.start(t0));
        assert!(!timer.start(t0 + Duration::from_millis(5)));
        assert_eq!(timer.deadline(), Some(t0 + PERIOD));
    }

    #[test]
    fn fires_once_per_period() {
        let t0 = Instant::now();
        let mut timer = RepeatTimer::new(PERIOD);
        timer.start(t0);
        assert!(!timer.poll(t0 + Duration::from_millis(10)));
        assert!(timer.poll(t0 + PERIOD));
        assert!(!timer.poll(t0 + PERIOD));
        assert!(timer.poll(t0 + PERIOD * 2));
    }

    #[test]
    fn late_poll_does_not_burst() {
        let t0 = Instant::now();
        let mut timer = RepeatTimer::new(PERIOD);
        timer.start(t0);
        let late = t0 + PERIOD * 5;
        assert!(timer.poll(late));
        assert!(!timer.poll(late));
        assert_eq!(timer.deadline(), Some(late + PERIOD));
    }

    #[test]
    fn stop_cancels() {
        let t0 = Instant::now();
        let mut timer = RepeatTimer::new(PERIOD);
        assert!(!timer.stop());
        timer.start(t0);
        assert!(timer.stop());
        assert!(!timer.is_running());
        assert!(!timer.poll(t0 + PERIOD * 3));
    }
}
