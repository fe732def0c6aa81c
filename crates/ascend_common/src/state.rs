//! User progression state and the completion/streak reducer (v0.1.0).
//!
//! `UserState` is the aggregate that gets persisted next to the habit list
//! and the achievement catalog. Only two components may touch `history`
//! (the daily reconciler) and the streak counters (the reconciler and
//! [`on_all_habits_completed`]).

use crate::calendar::CalendarDay;
use crate::progression::{xp_for_next_level, MAX_LEVEL};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Archived summary of one finished day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: CalendarDay,
    pub completed_habit_ids: Vec<String>,
}

/// Lifetime statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Minutes credited by the meditation habit
    pub total_meditation_minutes: u64,
    /// Day the reconciler last ran
    pub last_login_date: CalendarDay,
    pub current_streak: u32,
    /// Day every habit was last completed
    pub last_completion_date: Option<CalendarDay>,
    pub early_bird_count: u32,
    /// Newest first
    pub history: Vec<HistoryEntry>,
}

impl UserStats {
    pub fn new(today: CalendarDay) -> Self {
        Self {
            total_meditation_minutes: 0,
            last_login_date: today,
            current_streak: 0,
            last_completion_date: None,
            early_bird_count: 0,
            history: Vec::new(),
        }
    }

    pub fn has_history_for(&self, day: CalendarDay) -> bool {
        self.history.iter().any(|entry| entry.date == day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: u64,
    /// Derived from `level`; recomputed whenever state is loaded
    pub xp_to_next_level: u64,
    pub stats: UserStats,
}

impl UserState {
    pub fn new(today: CalendarDay) -> Self {
        Self {
            level: 1,
            current_xp: 0,
            xp_to_next_level: xp_for_next_level(1),
            stats: UserStats::new(today),
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= MAX_LEVEL
    }

    /// XP still needed for the next level (0 once the threshold is passed at the cap)
    pub fn xp_remaining(&self) -> u64 {
        self.xp_to_next_level.saturating_sub(self.current_xp)
    }

    /// Progress through the current level, clamped to 0.0 - 1.0
    pub fn progress_ratio(&self) -> f64 {
        if self.xp_to_next_level == 0 {
            return 1.0;
        }
        (self.current_xp as f64 / self.xp_to_next_level as f64).clamp(0.0, 1.0)
    }
}

/// Advance the streak when every habit reached its target on `today`.
///
/// Counting happens at most once per calendar day.
pub fn on_all_habits_completed(mut state: UserState, today: CalendarDay) -> UserState {
    if state.stats.last_completion_date == Some(today) {
        return state;
    }
    state.stats.current_streak += 1;
    state.stats.last_completion_date = Some(today);
    info!(
        streak = state.stats.current_streak,
        day = %today,
        "all habits completed"
    );
    state
}
