use std::time::{Duration, Instant};

use log::{debug, error};

use crate::config::TimeoutSource;
use crate::lid::LidState;

#[derive(Debug, Copy, Clone)]
struct Deadline {
    at: Instant,
    timeout: Duration,
}

/// Tracks the lid-closed shutdown countdown. A deadline is armed iff the
/// last observed state is closed and the configured timeout was positive at
/// the moment of closure; the timeout is re-read from its source on every
/// closure, so the value is fixed for the duration of a single closure but
/// picks up configuration edits on the next one.
pub struct ShutdownScheduler<S> {
    timeouts: S,
    deadline: Option<Deadline>,
}

impl<S: TimeoutSource> ShutdownScheduler<S> {
    pub fn new(timeouts: S) -> ShutdownScheduler<S> {
        ShutdownScheduler {
            timeouts,
            deadline: None,
        }
    }

    /// Feeds an observed lid state. Closing re-reads the configured timeout
    /// and replaces any prior deadline (zero leaves the scheduler disarmed);
    /// opening clears the deadline unconditionally; unknown states change
    /// nothing.
    pub fn observe(&mut self, state: LidState, now: Instant) {
        match state {
            LidState::Closed => {
                let timeout = self.timeouts.shutdown_timeout();
                self.deadline = if timeout.is_zero() {
                    None
                } else {
                    match now.checked_add(timeout) {
                        Some(at) => Some(Deadline { at, timeout }),
                        None => {
                            error!(
                                "shutdown timeout of {} seconds is too large, not arming",
                                timeout.as_secs()
                            );
                            None
                        }
                    }
                };
            }
            LidState::Open => {
                self.deadline = None;
            }
            LidState::Unknown => {
                debug!("ignoring unknown lid state");
            }
        }
    }

    /// Whether the armed deadline has been reached at `now`. Returns the
    /// timeout the deadline was armed with so the caller can report it.
    pub fn due(&self, now: Instant) -> Option<Duration> {
        match self.deadline {
            Some(deadline) if now >= deadline.at => Some(deadline.timeout),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct Fixed(u64);

    impl TimeoutSource for Fixed {
        fn shutdown_timeout(&self) -> Duration {
            Duration::from_secs(self.0)
        }
    }

    /// Hands out a different timeout on each read, like an operator editing
    /// the configuration file between closures.
    struct Queued(RefCell<VecDeque<u64>>);

    impl Queued {
        fn new(values: &[u64]) -> Queued {
            Queued(RefCell::new(values.iter().copied().collect()))
        }
    }

    impl TimeoutSource for Queued {
        fn shutdown_timeout(&self) -> Duration {
            let secs = self
                .0
                .borrow_mut()
                .pop_front()
                .expect("timeout values exhausted");
            Duration::from_secs(secs)
        }
    }

    #[test]
    fn closing_arms_at_now_plus_timeout() {
        let mut scheduler = ShutdownScheduler::new(Fixed(300));
        let start = Instant::now();

        scheduler.observe(LidState::Closed, start);

        assert!(scheduler.is_armed());
        assert_eq!(scheduler.due(start + Duration::from_secs(299)), None);
        assert_eq!(
            scheduler.due(start + Duration::from_secs(300)),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn opening_always_disarms() {
        let mut scheduler = ShutdownScheduler::new(Fixed(10));
        let start = Instant::now();

        scheduler.observe(LidState::Closed, start);
        scheduler.observe(LidState::Open, start + Duration::from_secs(3));

        assert!(!scheduler.is_armed());
        assert_eq!(scheduler.due(start + Duration::from_secs(30)), None);
    }

    #[test]
    fn repeated_opens_are_idempotent() {
        let mut scheduler = ShutdownScheduler::new(Fixed(10));
        let start = Instant::now();

        scheduler.observe(LidState::Open, start);
        scheduler.observe(LidState::Open, start + Duration::from_secs(1));

        assert!(!scheduler.is_armed());
    }

    #[test]
    fn zero_timeout_never_arms() {
        let mut scheduler = ShutdownScheduler::new(Fixed(0));
        let start = Instant::now();

        scheduler.observe(LidState::Closed, start);

        assert!(!scheduler.is_armed());
        assert_eq!(scheduler.due(start + Duration::from_secs(3600)), None);
    }

    #[test]
    fn oversized_timeout_leaves_scheduler_disarmed() {
        let mut scheduler = ShutdownScheduler::new(Fixed(u64::MAX));
        let start = Instant::now();

        scheduler.observe(LidState::Closed, start);

        assert!(!scheduler.is_armed());
        assert_eq!(scheduler.due(start + Duration::from_secs(3600)), None);
    }

    #[test]
    fn reclosing_uses_latest_timeout() {
        let mut scheduler = ShutdownScheduler::new(Queued::new(&[10, 5]));
        let start = Instant::now();

        scheduler.observe(LidState::Closed, start);
        scheduler.observe(LidState::Open, start + Duration::from_secs(1));
        scheduler.observe(LidState::Closed, start + Duration::from_secs(2));

        assert_eq!(scheduler.due(start + Duration::from_secs(6)), None);
        assert_eq!(
            scheduler.due(start + Duration::from_secs(7)),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn zero_then_positive_rearms_on_next_closure() {
        let mut scheduler = ShutdownScheduler::new(Queued::new(&[0, 5]));
        let start = Instant::now();

        scheduler.observe(LidState::Closed, start);
        assert_eq!(scheduler.due(start + Duration::from_secs(60)), None);

        scheduler.observe(LidState::Open, start + Duration::from_secs(61));
        scheduler.observe(LidState::Closed, start + Duration::from_secs(62));

        assert_eq!(
            scheduler.due(start + Duration::from_secs(67)),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn unknown_states_change_nothing() {
        let mut scheduler = ShutdownScheduler::new(Fixed(5));
        let start = Instant::now();

        scheduler.observe(LidState::Closed, start);
        scheduler.observe(LidState::Unknown, start + Duration::from_secs(1));

        assert!(scheduler.is_armed());
        assert_eq!(
            scheduler.due(start + Duration::from_secs(5)),
            Some(Duration::from_secs(5))
        );
    }
}
