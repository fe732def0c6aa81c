//! Daily reconciliation (v0.2.0).
//!
//! Runs whenever state is loaded. Compares the stored `last_login_date` with
//! today and, on a new day, archives the previous day's completions, resets
//! every habit counter and decides whether the streak survives.
//!
//! ## Transitions
//!
//! - `SameDay`: nothing to do; reloading on the same day is a no-op.
//! - `StreakKept`: new day, last full completion was yesterday or today.
//! - `StreakBroken`: new day with a gap since the last full completion.
//!
//! The streak is never incremented here. That happens in
//! [`crate::state::on_all_habits_completed`] when today's habits are done.

use crate::calendar::CalendarDay;
use crate::habits::{completed_ids, Habit};
use crate::state::{HistoryEntry, UserState, UserStats};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayTransition {
    SameDay,
    StreakKept { days_elapsed: i64 },
    StreakBroken { days_elapsed: i64 },
}

impl DayTransition {
    pub fn is_new_day(&self) -> bool {
        !matches!(self, DayTransition::SameDay)
    }
}

/// Decide which transition applies for `today`.
pub fn classify(stats: &UserStats, today: CalendarDay) -> DayTransition {
    if stats.last_login_date == today {
        return DayTransition::SameDay;
    }

    let days_elapsed = today.days_since(stats.last_login_date);
    let yesterday = today.yesterday();
    match stats.last_completion_date {
        Some(day) if day == yesterday || day == today => DayTransition::StreakKept { days_elapsed },
        _ => DayTransition::StreakBroken { days_elapsed },
    }
}

/// Output of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub state: UserState,
    pub habits: Vec<Habit>,
    pub transition: DayTransition,
    /// History entry written by this pass, if any
    pub archived: Option<HistoryEntry>,
}

/// Bring loaded state forward to `today`.
pub fn reconcile(mut state: UserState, mut habits: Vec<Habit>, today: CalendarDay) -> Reconciled {
    let transition = classify(&state.stats, today);
    if transition == DayTransition::SameDay {
        debug!(day = %today, "same-day reload, nothing to reconcile");
        return Reconciled {
            state,
            habits,
            transition,
            archived: None,
        };
    }

    let previous = state.stats.last_login_date;

    // Archive from the counters as the previous session left them.
    let done = completed_ids(&habits);
    let archived = if !done.is_empty() && !state.stats.has_history_for(previous) {
        let entry = HistoryEntry {
            date: previous,
            completed_habit_ids: done,
        };
        state.stats.history.insert(0, entry.clone());
        Some(entry)
    } else {
        None
    };

    for habit in habits.iter_mut() {
        habit.current = 0;
    }

    if let DayTransition::StreakBroken { .. } = transition {
        if state.stats.current_streak > 0 {
            info!(
                streak = state.stats.current_streak,
                last_completion = ?state.stats.last_completion_date.map(|d| d.to_string()),
                "streak broken"
            );
        }
        state.stats.current_streak = 0;
    }

    state.stats.last_login_date = today;

    info!(
        from = %previous,
        to = %today,
        ?transition,
        archived = archived.is_some(),
        "day boundary reconciled"
    );

    Reconciled {
        state,
        habits,
        transition,
        archived,
    }
}
