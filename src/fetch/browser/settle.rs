//! Waiting for the client-rendered tag list to stop growing, and nudging it
//! when it settles short.

use std::time::Duration;

/// Result of one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleState {
    /// Keep polling.
    Pending,
    /// The count held steady for the whole window.
    Settled(usize),
    /// The time limit ran out first; carries the last count.
    TimedOut(usize),
}

impl SettleState {
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::Pending => None,
            Self::Settled(n) | Self::TimedOut(n) => Some(*n),
        }
    }
}

/// Tracks tag counts sampled over time.
///
/// Fed with the time elapsed since polling began, so it needs no clock of
/// its own.
#[derive(Debug, Clone)]
pub struct TagSettler {
    window: Duration,
    limit: Duration,
    last: Option<usize>,
    steady_since: Duration,
    increasing: bool,
}

impl TagSettler {
    pub fn new(window: Duration, limit: Duration) -> Self {
        Self {
            window,
            limit,
            last: None,
            steady_since: Duration::ZERO,
            increasing: false,
        }
    }

    /// Record a count sampled `elapsed` after polling started.
    pub fn observe(&mut self, elapsed: Duration, count: usize) -> SettleState {
        if self.last != Some(count) {
            self.increasing = self.last.is_some_and(|prev| count > prev);
            self.last = Some(count);
            self.steady_since = elapsed;
        }

        if elapsed.saturating_sub(self.steady_since) >= self.window {
            SettleState::Settled(count)
        } else if elapsed >= self.limit {
            SettleState::TimedOut(count)
        } else {
            SettleState::Pending
        }
    }

    /// Whether the latest change raised the count.
    pub fn is_increasing(&self) -> bool {
        self.increasing
    }

    pub fn last_count(&self) -> Option<usize> {
        self.last
    }
}

/// Steps taken, in order, while the tag list stays short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    ScrollIntoView,
    Pause,
}

pub const RECOVERY_PLAN: [RecoveryAction; 2] = [RecoveryAction::ScrollIntoView, RecoveryAction::Pause];

/// Walks the recovery plan for a settled tag count.
///
/// Each call to [`TagRecovery::next_action`] reports the count seen after the
/// previous step and returns the next step to run, or `None` once the count
/// reaches the minimum or the plan is used up.
#[derive(Debug, Clone)]
pub struct TagRecovery {
    min_expected: usize,
    taken: usize,
}

impl TagRecovery {
    pub fn new(min_expected: usize) -> Self {
        Self {
            min_expected,
            taken: 0,
        }
    }

    pub fn next_action(&mut self, count: usize) -> Option<RecoveryAction> {
        if count >= self.min_expected {
            return None;
        }
        let action = RECOVERY_PLAN.get(self.taken).copied()?;
        self.taken += 1;
        Some(action)
    }

    /// Steps handed out so far.
    pub fn steps_taken(&self) -> usize {
        self.taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn settler() -> TagSettler {
        TagSettler::new(ms(1000), ms(5000))
    }

    /// Feed samples at 100 ms intervals, returning the first terminal state
    /// and when it happened.
    fn run(settler: &mut TagSettler, counts: impl Fn(u64) -> usize) -> (u64, SettleState) {
        let mut t = 0;
        loop {
            let state = settler.observe(ms(t), counts(t));
            if state != SettleState::Pending {
                return (t, state);
            }
            t += 100;
        }
    }

    #[test]
    fn test_steady_count_settles_after_window() {
        let mut s = settler();
        let (t, state) = run(&mut s, |_| 12);
        assert_eq!(t, 1000);
        assert_eq!(state, SettleState::Settled(12));
        assert!(!s.is_increasing());
    }

    #[test]
    fn test_growth_restarts_window() {
        let mut s = settler();
        let (t, state) = run(&mut s, |t| if t < 300 { 10 } else if t < 700 { 25 } else { 38 });
        assert_eq!(t, 1700);
        assert_eq!(state, SettleState::Settled(38));
        assert!(s.is_increasing());
    }

    #[test]
    fn test_times_out_while_still_growing() {
        let mut s = settler();
        let (t, state) = run(&mut s, |t| (t / 100) as usize);
        assert_eq!(t, 5000);
        assert_eq!(state, SettleState::TimedOut(50));
        assert!(s.is_increasing());
    }

    #[test]
    fn test_shrinking_count_is_not_increasing() {
        let mut s = settler();
        assert_eq!(s.observe(ms(0), 30), SettleState::Pending);
        assert_eq!(s.observe(ms(100), 28), SettleState::Pending);
        assert!(!s.is_increasing());
        assert_eq!(s.last_count(), Some(28));
    }

    #[test]
    fn test_settle_state_count() {
        assert_eq!(SettleState::Pending.count(), None);
        assert_eq!(SettleState::Settled(3).count(), Some(3));
        assert_eq!(SettleState::TimedOut(4).count(), Some(4));
    }

    #[test]
    fn test_recovery_skipped_when_count_is_enough() {
        let mut r = TagRecovery::new(35);
        assert_eq!(r.next_action(35), None);
        assert_eq!(r.next_action(40), None);
        assert_eq!(r.steps_taken(), 0);
    }

    #[test]
    fn test_recovery_scrolls_then_pauses_then_stops() {
        let mut r = TagRecovery::new(35);
        assert_eq!(r.next_action(10), Some(RecoveryAction::ScrollIntoView));
        assert_eq!(r.next_action(12), Some(RecoveryAction::Pause));
        assert_eq!(r.next_action(12), None);
        assert_eq!(r.next_action(0), None);
        assert_eq!(r.steps_taken(), 2);
    }

    #[test]
    fn test_recovery_stops_once_minimum_reached() {
        let mut r = TagRecovery::new(35);
        assert_eq!(r.next_action(20), Some(RecoveryAction::ScrollIntoView));
        assert_eq!(r.next_action(36), None);
        assert_eq!(r.steps_taken(), 1);
    }
}
