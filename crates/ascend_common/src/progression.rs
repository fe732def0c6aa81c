//! XP / level engine (v0.1.0).
//!
//! ## XP Curve
//!
//! XP required to leave level L: floor(100 * 1.05^(L-1))
//! - Level 1: 100 XP
//! - Level 2: 105 XP
//! - Level 10: 155 XP
//!
//! Levels stop at 100. XP earned past the last threshold is kept as-is.

use crate::state::UserState;
use tracing::info;

pub const BASE_XP_THRESHOLD: u64 = 100;

/// XP granted for every successful habit increment
pub const XP_PER_ACTION: u64 = 15;

pub const MAX_LEVEL: u32 = 100;

const GROWTH_FACTOR: f64 = 1.05;

/// XP needed to advance from `level` to the next one.
pub fn xp_for_next_level(level: u32) -> u64 {
    let exponent = level.saturating_sub(1) as f64;
    (BASE_XP_THRESHOLD as f64 * GROWTH_FACTOR.powf(exponent)).floor() as u64
}

/// Result of crediting XP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpOutcome {
    pub state: UserState,
    pub leveled_up: bool,
    pub levels_gained: u32,
}

/// Add `amount` XP, rolling over as many levels as it pays for.
pub fn apply_xp(mut state: UserState, amount: u64) -> XpOutcome {
    let start_level = state.level;
    let mut threshold = xp_for_next_level(state.level);
    state.current_xp = state.current_xp.saturating_add(amount);

    while state.current_xp >= threshold && state.level < MAX_LEVEL {
        state.current_xp -= threshold;
        state.level += 1;
        threshold = xp_for_next_level(state.level);
    }
    state.xp_to_next_level = threshold;

    let levels_gained = state.level.saturating_sub(start_level);
    if levels_gained > 0 {
        info!(level = state.level, gained = levels_gained, "level up");
    }

    XpOutcome {
        state,
        leveled_up: levels_gained > 0,
        levels_gained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarDay;

    fn fresh() -> UserState {
        UserState::new(CalendarDay::from_ymd(2026, 10, 18).unwrap())
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(xp_for_next_level(1), 100);
        assert_eq!(xp_for_next_level(2), 105);
        assert_eq!(xp_for_next_level(3), 110);
        assert_eq!(xp_for_next_level(10), 155);
    }

    #[test]
    fn test_small_gain_no_level() {
        let out = apply_xp(fresh(), XP_PER_ACTION);
        assert!(!out.leveled_up);
        assert_eq!(out.state.level, 1);
        assert_eq!(out.state.current_xp, 15);
        assert_eq!(out.state.xp_to_next_level, 100);
    }

    #[test]
    fn test_exact_threshold_levels_up() {
        let out = apply_xp(fresh(), 100);
        assert!(out.leveled_up);
        assert_eq!(out.state.level, 2);
        assert_eq!(out.state.current_xp, 0);
        assert_eq!(out.state.xp_to_next_level, 105);
    }

    #[test]
    fn test_multi_level_gain() {
        // 100 + 105 + 110 = 315
        let out = apply_xp(fresh(), 320);
        assert_eq!(out.levels_gained, 3);
        assert_eq!(out.state.level, 4);
        assert_eq!(out.state.current_xp, 5);
    }

    #[test]
    fn test_cap_retains_excess_xp() {
        let mut state = fresh();
        state.level = MAX_LEVEL;
        state.xp_to_next_level = xp_for_next_level(MAX_LEVEL);
        let threshold = state.xp_to_next_level;

        let out = apply_xp(state, threshold * 3);
        assert!(!out.leveled_up);
        assert_eq!(out.state.level, MAX_LEVEL);
        assert_eq!(out.state.current_xp, threshold * 3);
    }

    #[test]
    fn test_never_exceeds_cap() {
        for amount in [0, 1, 99, 100, 5_000, 50_000, 10_000_000] {
            let out = apply_xp(fresh(), amount);
            assert!(out.state.level <= MAX_LEVEL);
            if out.state.level < MAX_LEVEL {
                assert!(out.state.current_xp < out.state.xp_to_next_level);
            }
        }
    }

    #[test]
    fn test_repeated_actions_match_single_gain() {
        let mut state = fresh();
        for _ in 0..40 {
            state = apply_xp(state, XP_PER_ACTION).state;
        }
        let bulk = apply_xp(fresh(), XP_PER_ACTION * 40).state;
        assert_eq!(state.level, bulk.level);
        assert_eq!(state.current_xp, bulk.current_xp);
    }
}
