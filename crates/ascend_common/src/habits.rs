//! Habit catalog and the increment action.

use crate::i18n::Language;
use crate::progression::XP_PER_ACTION;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Only this habit feeds `total_meditation_minutes`
pub const MEDITATION_HABIT_ID: &str = "3";

/// Local hours [start, end) that count as an early-bird action
pub const EARLY_BIRD_START_HOUR: u32 = 4;
pub const EARLY_BIRD_END_HOUR: u32 = 8;

/// A repeatable daily task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub title: String,
    pub unit: String,
    /// Progress today; reset at every day boundary
    pub current: u32,
    pub target: u32,
    pub increment_value: u32,
}

impl Habit {
    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }

    pub fn is_meditation(&self) -> bool {
        self.id == MEDITATION_HABIT_ID
    }
}

/// (id, target, increment) for the six built-in habits
const CATALOG: [(&str, u32, u32); 6] = [
    ("1", 8, 1),
    ("2", 10, 2),
    ("3", 10, 5),
    ("4", 30, 10),
    ("5", 1, 1),
    ("6", 5000, 500),
];

/// Fresh habit list in catalog order.
pub fn default_habits(language: Language) -> Vec<Habit> {
    let strings = language.strings();
    CATALOG
        .iter()
        .map(|&(id, target, increment_value)| {
            let label = strings.habit(id);
            Habit {
                id: id.to_string(),
                title: label.map(|l| l.title).unwrap_or(id).to_string(),
                unit: label.map(|l| l.unit).unwrap_or_default().to_string(),
                current: 0,
                target,
                increment_value,
            }
        })
        .collect()
}

/// Refresh titles and units for `language`; unknown ids keep their text.
pub fn localize(habits: &mut [Habit], language: Language) {
    let strings = language.strings();
    for habit in habits.iter_mut() {
        if let Some(label) = strings.habit(&habit.id) {
            habit.title = label.title.to_string();
            habit.unit = label.unit.to_string();
        }
    }
}

pub fn all_complete(habits: &[Habit]) -> bool {
    habits.iter().all(Habit::is_complete)
}

/// Ids of habits at or above target, in list order.
pub fn completed_ids(habits: &[Habit]) -> Vec<String> {
    habits
        .iter()
        .filter(|h| h.is_complete())
        .map(|h| h.id.clone())
        .collect()
}

pub fn is_early_bird_hour(hour: u32) -> bool {
    (EARLY_BIRD_START_HOUR..EARLY_BIRD_END_HOUR).contains(&hour)
}

/// What one successful increment earned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementOutcome {
    pub habit_id: String,
    pub new_value: u32,
    pub xp_awarded: u64,
    pub early_bird: bool,
    pub meditation_delta: u64,
    /// Every habit is at target after this increment
    pub all_complete: bool,
}

/// Bump one habit by its increment, clamped to target.
///
/// Returns `None` (and changes nothing) for unknown ids, habits already at
/// target, or increments that would not move the value.
pub fn increment(habits: &mut [Habit], habit_id: &str, local_hour: u32) -> Option<IncrementOutcome> {
    let habit = habits.iter_mut().find(|h| h.id == habit_id)?;
    if habit.is_complete() {
        debug!(habit = habit_id, "increment ignored: already complete");
        return None;
    }

    let new_value = habit.current.saturating_add(habit.increment_value).min(habit.target);
    if new_value == habit.current {
        return None;
    }
    habit.current = new_value;

    let meditation_delta = if habit.is_meditation() {
        habit.increment_value as u64
    } else {
        0
    };

    Some(IncrementOutcome {
        habit_id: habit_id.to_string(),
        new_value,
        xp_awarded: XP_PER_ACTION,
        early_bird: is_early_bird_hour(local_hour),
        meditation_delta,
        all_complete: all_complete(habits),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        let habits = default_habits(Language::En);
        assert_eq!(habits.len(), 6);
        assert_eq!(habits[0].title, "Drink Water");
        assert_eq!(habits[2].id, MEDITATION_HABIT_ID);
        assert_eq!(habits[5].target, 5000);
        assert!(habits.iter().all(|h| h.current == 0));
    }

    #[test]
    fn test_meditation_two_steps() {
        let mut habits = default_habits(Language::En);

        let first = increment(&mut habits, "3", 12).unwrap();
        assert_eq!(first.new_value, 5);
        assert_eq!(first.meditation_delta, 5);
        assert!(!habits[2].is_complete());

        let second = increment(&mut habits, "3", 12).unwrap();
        assert_eq!(second.new_value, 10);
        assert_eq!(first.meditation_delta + second.meditation_delta, 10);
        assert!(habits[2].is_complete());

        assert!(increment(&mut habits, "3", 12).is_none());
    }

    #[test]
    fn test_increment_clamps_to_target() {
        let mut habits = default_habits(Language::En);
        habits[3].current = 25;
        let out = increment(&mut habits, "4", 12).unwrap();
        assert_eq!(out.new_value, 30);
        assert_eq!(out.xp_awarded, XP_PER_ACTION);
    }

    #[test]
    fn test_unknown_habit_is_noop() {
        let mut habits = default_habits(Language::En);
        let before = habits.clone();
        assert!(increment(&mut habits, "99", 5).is_none());
        assert_eq!(habits, before);
    }

    #[test]
    fn test_early_bird_window() {
        assert!(!is_early_bird_hour(3));
        assert!(is_early_bird_hour(4));
        assert!(is_early_bird_hour(7));
        assert!(!is_early_bird_hour(8));

        let mut habits = default_habits(Language::En);
        assert!(increment(&mut habits, "1", 6).unwrap().early_bird);
        assert!(!increment(&mut habits, "1", 9).unwrap().early_bird);
    }

    #[test]
    fn test_last_increment_reports_all_complete() {
        let mut habits = default_habits(Language::En);
        for h in habits.iter_mut() {
            h.current = h.target;
        }
        habits[4].current = 0;
        let out = increment(&mut habits, "5", 12).unwrap();
        assert!(out.all_complete);
        assert_eq!(completed_ids(&habits).len(), 6);
    }

    #[test]
    fn test_localize_switches_titles() {
        let mut habits = default_habits(Language::En);
        localize(&mut habits, Language::Es);
        assert_eq!(habits[0].title, "Beber Agua");
        assert_eq!(habits[1].unit, "Páginas");
    }
}
