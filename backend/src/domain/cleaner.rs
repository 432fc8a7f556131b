//! Cleaner streak bookkeeping.
//!
//! The streak counts consecutive verified logs. Every log counted is
//! remembered in a short bounded history so a redelivered log is not counted
//! twice.

use std::collections::VecDeque;

use crate::domain::{CleanerId, LogId};

/// Number of recently counted log ids remembered per cleaner.
pub const COUNTED_LOG_HISTORY: usize = 32;

/// Streak value that triggers a supervisor spot check.
pub const DEFAULT_AUDIT_THRESHOLD: u32 = 10;

/// What happened when a verified log was applied to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakAdvance {
    /// The streak grew to the carried value.
    Incremented(u32),
    /// The streak reached the threshold and was reset to zero.
    AuditTriggered {
        /// Streak value that triggered the audit.
        reached: u32,
    },
    /// The log had already been counted.
    AlreadyCounted,
}

/// Streak state stored on the cleaner's user document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanerStreak {
    /// Cleaner the streak belongs to.
    pub cleaner_id: CleanerId,
    verified_streak: u32,
    counted_log_ids: VecDeque<LogId>,
}

impl CleanerStreak {
    /// A cleaner with no verified logs counted yet.
    pub fn new(cleaner_id: CleanerId) -> Self {
        Self {
            cleaner_id,
            verified_streak: 0,
            counted_log_ids: VecDeque::with_capacity(COUNTED_LOG_HISTORY),
        }
    }

    /// Seed a stored streak value.
    #[must_use]
    pub fn with_streak(mut self, verified_streak: u32) -> Self {
        self.verified_streak = verified_streak;
        self
    }

    /// Rebuild a stored streak with its counted-log history, oldest first.
    /// Only the most recent [`COUNTED_LOG_HISTORY`] ids are kept.
    pub fn restore(
        cleaner_id: CleanerId,
        verified_streak: u32,
        counted: impl IntoIterator<Item = LogId>,
    ) -> Self {
        let mut counted_log_ids: VecDeque<LogId> = counted.into_iter().collect();
        let excess = counted_log_ids.len().saturating_sub(COUNTED_LOG_HISTORY);
        counted_log_ids.drain(..excess);
        Self {
            cleaner_id,
            verified_streak,
            counted_log_ids,
        }
    }

    /// Current count of consecutive verified logs.
    #[must_use]
    pub fn verified_streak(&self) -> u32 {
        self.verified_streak
    }

    /// Recently counted log ids, oldest first.
    pub fn counted_log_ids(&self) -> impl Iterator<Item = &LogId> {
        self.counted_log_ids.iter()
    }

    /// Count `log_id` towards the streak.
    ///
    /// Reaching `threshold` (or a value above it, left by a lowered
    /// threshold) resets the streak to zero.
    ///
    /// # Examples
    /// ```
    /// use vericlean::domain::{CleanerStreak, LogId, StreakAdvance};
    ///
    /// let mut streak = CleanerStreak::new("cleaner_1".into()).with_streak(9);
    /// assert_eq!(
    ///     streak.advance(&LogId::new("log_10"), 10),
    ///     StreakAdvance::AuditTriggered { reached: 10 }
    /// );
    /// assert_eq!(streak.verified_streak(), 0);
    /// ```
    pub fn advance(&mut self, log_id: &LogId, threshold: u32) -> StreakAdvance {
        if self.counted_log_ids.contains(log_id) {
            return StreakAdvance::AlreadyCounted;
        }
        if self.counted_log_ids.len() == COUNTED_LOG_HISTORY {
            self.counted_log_ids.pop_front();
        }
        self.counted_log_ids.push_back(log_id.clone());

        let next = self.verified_streak.saturating_add(1);
        if next >= threshold {
            self.verified_streak = 0;
            StreakAdvance::AuditTriggered { reached: next }
        } else {
            self.verified_streak = next;
            StreakAdvance::Incremented(next)
        }
    }

    /// Reset after a rejected log. Counted history is kept.
    pub fn reset(&mut self) {
        self.verified_streak = 0;
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn streak_at(value: u32) -> CleanerStreak {
        CleanerStreak::new(CleanerId::new("cleaner_001")).with_streak(value)
    }

    #[rstest]
    #[case(0, StreakAdvance::Incremented(1), 1)]
    #[case(8, StreakAdvance::Incremented(9), 9)]
    #[case(9, StreakAdvance::AuditTriggered { reached: 10 }, 0)]
    #[case(14, StreakAdvance::AuditTriggered { reached: 15 }, 0)]
    fn advance_applies_threshold(
        #[case] start: u32,
        #[case] expected: StreakAdvance,
        #[case] stored: u32,
    ) {
        let mut streak = streak_at(start);
        assert_eq!(
            streak.advance(&LogId::new("log_x"), DEFAULT_AUDIT_THRESHOLD),
            expected
        );
        assert_eq!(streak.verified_streak(), stored);
    }

    #[test]
    fn redelivered_log_is_not_counted_twice() {
        let mut streak = streak_at(3);
        let log = LogId::new("log_dup");
        assert_eq!(streak.advance(&log, 10), StreakAdvance::Incremented(4));
        assert_eq!(streak.advance(&log, 10), StreakAdvance::AlreadyCounted);
        assert_eq!(streak.verified_streak(), 4);
    }

    #[test]
    fn history_is_bounded() {
        let mut streak = streak_at(0);
        for n in 0..=COUNTED_LOG_HISTORY {
            streak.advance(&LogId::new(format!("log_{n}")), u32::MAX);
        }
        assert_eq!(streak.counted_log_ids.len(), COUNTED_LOG_HISTORY);
        assert!(!streak.counted_log_ids.contains(&LogId::new("log_0")));
    }

    #[test]
    fn reset_clears_streak() {
        let mut streak = streak_at(7);
        streak.reset();
        assert_eq!(streak.verified_streak(), 0);
    }

    #[test]
    fn restored_history_still_rejects_counted_logs() {
        let counted = (0..40).map(|n| LogId::new(format!("log_{n}")));
        let mut streak = CleanerStreak::restore(CleanerId::new("cleaner_001"), 3, counted);

        assert_eq!(streak.counted_log_ids().count(), COUNTED_LOG_HISTORY);
        assert_eq!(
            streak.advance(&LogId::new("log_39"), DEFAULT_AUDIT_THRESHOLD),
            StreakAdvance::AlreadyCounted
        );
        assert_eq!(
            streak.advance(&LogId::new("log_0"), DEFAULT_AUDIT_THRESHOLD),
            StreakAdvance::Incremented(4)
        );
    }
}
