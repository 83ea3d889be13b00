use std::time::{Duration, Instant};

/// Quiet period before a burst of change events turns into one reload.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// One-shot timer that can be re-armed, cancelled and fired at most once per
/// arming. Time is passed in by the caller so the owner's event loop decides
/// when to look at it.
///
/// Once closed the timer never fires again, even if re-armed.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
    closed: bool,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            closed: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start the timer, or push its deadline back if already running.
    /// Returns `false` on a closed timer.
    pub fn arm(&mut self, now: Instant) -> bool {
        if self.closed {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` exactly once when the deadline has passed, disarming
    /// the timer.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if !self.closed && now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEBOUNCE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_fires_once_after_last_event() {
        let start = Instant::now();
        let mut d = Debounce::default();
        d.arm(start);
        d.arm(start + Duration::from_millis(300));
        assert!(!d.fire(start + Duration::from_millis(600)));
        assert!(d.fire(start + Duration::from_millis(800)));
        assert!(!d.fire(start + Duration::from_millis(900)));
        assert!(!d.is_armed());
    }

    #[test]
    fn cancelled_timer_does_not_fire() {
        let start = Instant::now();
        let mut d = Debounce::default();
        d.arm(start);
        d.cancel();
        assert!(!d.fire(start + Duration::from_secs(5)));
    }

    #[test]
    fn closed_timer_ignores_rearm() {
        let start = Instant::now();
        let mut d = Debounce::default();
        d.arm(start);
        d.close();
        d.close();
        assert!(!d.arm(start));
        assert!(!d.fire(start + Duration::from_secs(5)));
        assert_eq!(d.deadline(), None);
    }
}
