//! Tests for loading saved blobs from older and partial schemas (v0.3.0).

use ascend_common::persistence::{merge_loaded, parse_blob, to_blob, to_json, Preferences};
use ascend_common::reconcile::DayTransition;
use ascend_common::store::LocalStore;
use ascend_common::tracker::{restore, LoadSource, Tracker};
use ascend_common::{CalendarDay, Language, Theme};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

fn day(d: u32) -> CalendarDay {
    CalendarDay::from_ymd(2026, 10, d).unwrap()
}

#[test]
fn test_single_unlock_blob_rebuilds_full_catalog() {
    let raw = r#"{ "achievements": [ { "id": "lvl_4", "unlocked": true } ] }"#;
    let blob = parse_blob(raw).unwrap();
    let snap = merge_loaded(Some(blob), day(18), Preferences::default());

    assert_eq!(snap.achievements.len(), 100);
    let unlocked: Vec<_> = snap
        .achievements
        .iter()
        .filter(|a| a.unlocked)
        .map(|a| a.id.as_str())
        .collect();
    assert_eq!(unlocked, vec!["lvl_4"]);
}

#[test]
fn test_old_schema_without_new_stats() {
    let raw = r#"{
        "userState": {
            "level": 3,
            "currentXP": 40,
            "xpToNextLevel": 9999,
            "stats": {
                "totalMeditationMinutes": 25,
                "lastLoginDate": "Sat Oct 17 2026",
                "currentStreak": 2
            }
        },
        "language": "en"
    }"#;
    let blob = parse_blob(raw).unwrap();
    let snap = merge_loaded(Some(blob), day(18), Preferences::default());
    let state = &snap.user_state;

    assert_eq!(state.level, 3);
    assert_eq!(state.current_xp, 40);
    assert_eq!(state.xp_to_next_level, 110);
    assert_eq!(state.stats.early_bird_count, 0);
    assert!(state.stats.history.is_empty());
    assert_eq!(state.stats.last_completion_date, None);
    assert_eq!(state.stats.last_login_date, day(17));
    assert_eq!(snap.language, Language::En);
}

#[test]
fn test_saved_titles_are_not_trusted() {
    let raw = r#"{
        "language": "es",
        "achievements": [ { "id": "str_3", "unlocked": true, "title": "Stale Title" } ],
        "habits": [ { "id": "1", "title": "Old water", "current": 3, "target": 8, "incrementValue": 1 } ]
    }"#;
    let snap = merge_loaded(Some(parse_blob(raw).unwrap()), day(18), Preferences::default());

    let streak = snap.achievements.iter().find(|a| a.id == "str_3").unwrap();
    assert!(streak.unlocked);
    assert_eq!(streak.title, "Racha de 3 Días");

    let water = &snap.habits[0];
    assert_eq!(water.current, 3);
    assert_ne!(water.title, "Old water");
}

#[test]
fn test_unknown_habits_dropped() {
    let raw = r#"{ "habits": [ { "id": "42", "current": 7 }, { "id": "6", "current": 1500 } ] }"#;
    let snap = merge_loaded(Some(parse_blob(raw).unwrap()), day(18), Preferences::default());

    assert_eq!(snap.habits.len(), 6);
    assert!(snap.habits.iter().all(|h| h.id != "42"));
    assert_eq!(snap.habits.iter().find(|h| h.id == "6").unwrap().current, 1500);
}

#[test]
fn test_missing_preferences_fall_back() {
    let prefs = Preferences {
        language: Language::En,
        theme: Theme::Dark,
    };
    let snap = merge_loaded(Some(parse_blob("{}").unwrap()), day(18), prefs);
    assert_eq!(snap.language, Language::En);
    assert_eq!(snap.theme, Theme::Dark);
    assert_eq!(snap.user_state.stats.last_login_date, day(18));
}

#[test]
fn test_corrupt_blob_is_an_error() {
    assert!(parse_blob("{\"userState\": ").is_err());
    assert!(parse_blob("\"not a blob\"").is_err());
}

#[test]
fn test_written_blob_uses_client_field_names() {
    let snap = merge_loaded(None, day(18), Preferences::default());
    let json = to_json(&snap).unwrap();

    assert!(json.contains("\"userState\""));
    assert!(json.contains("\"currentXP\""));
    assert!(json.contains("\"xpToNextLevel\""));
    assert!(json.contains("\"lastLoginDate\": \"Sun Oct 18 2026\""));
    assert!(json.contains("\"completedHabitIds\"") || json.contains("\"history\": []"));
    assert!(json.contains("\"incrementValue\""));
    assert!(json.contains("\"language\": \"es\""));
}

#[test]
fn test_restore_is_pure_for_same_inputs() {
    let mut snap = merge_loaded(None, day(18), Preferences::default());
    snap.habits[4].current = 1;
    snap.user_state.stats.current_streak = 5;
    let blob = to_blob(&snap);

    let (first, first_report) = restore(Some(blob.clone()), day(21), Preferences::default());
    let (second, second_report) = restore(Some(blob), day(21), Preferences::default());

    assert_eq!(first, second);
    assert_eq!(first_report, second_report);
    assert_eq!(first_report.transition, DayTransition::StreakBroken { days_elapsed: 3 });
    assert_eq!(first.user_state.stats.current_streak, 0);
}

#[test]
fn test_restore_unlocks_from_loaded_stats() {
    let raw = r#"{ "userState": { "level": 8, "currentXP": 0, "stats": { "lastLoginDate": "Sun Oct 18 2026" } } }"#;
    let (snap, report) = restore(Some(parse_blob(raw).unwrap()), day(18), Preferences::default());

    let ids: Vec<_> = snap
        .achievements
        .iter()
        .filter(|a| a.unlocked)
        .map(|a| a.id.as_str())
        .collect();
    assert_eq!(ids, vec!["lvl_4", "lvl_8"]);
    assert_eq!(report.unlocked.len(), 2);
}

#[test]
fn test_negative_habit_progress_clamps_to_zero() {
    let raw = r#"{
        "userState": { "level": 6, "currentXP": 70, "stats": { "currentStreak": 4, "lastLoginDate": "Sun Oct 18 2026" } },
        "habits": [
            { "id": "1", "current": -2, "target": 8, "incrementValue": 1 },
            { "id": "2", "current": 1 },
            { "id": "3", "current": 5, "target": 0, "incrementValue": -5 }
        ]
    }"#;
    let snap = merge_loaded(Some(parse_blob(raw).unwrap()), day(18), Preferences::default());

    assert_eq!(snap.user_state.level, 6);
    assert_eq!(snap.user_state.stats.current_streak, 4);
    assert_eq!(snap.habits[0].current, 0);
    assert_eq!(snap.habits[1].current, 1);
    let meditation = snap.habits.iter().find(|h| h.id == "3").unwrap();
    assert_eq!(meditation.current, 5);
    assert!(meditation.target > 0);
    assert!(meditation.increment_value > 0);
    assert!(!meditation.is_complete());
}

#[test]
fn test_fractional_counters_are_rounded() {
    let raw = r#"{
        "userState": {
            "level": 4.0,
            "currentXP": 30.4,
            "stats": { "totalMeditationMinutes": 12.5, "earlyBirdCount": "3", "currentStreak": 2 }
        }
    }"#;
    let snap = merge_loaded(Some(parse_blob(raw).unwrap()), day(18), Preferences::default());
    let state = &snap.user_state;

    assert_eq!(state.level, 4);
    assert_eq!(state.current_xp, 30);
    assert_eq!(state.stats.total_meditation_minutes, 13);
    assert_eq!(state.stats.early_bird_count, 3);
    assert_eq!(state.stats.current_streak, 2);
}

#[test]
fn test_unreadable_history_entries_are_dropped() {
    let raw = r#"{
        "userState": {
            "level": 5,
            "stats": {
                "currentStreak": 3,
                "history": [
                    { "date": null, "completedHabitIds": ["1"] },
                    { "date": "Sat Oct 17 2026", "completedHabitIds": ["1", 2, null] },
                    42,
                    { "date": 20261016 }
                ]
            }
        }
    }"#;
    let snap = merge_loaded(Some(parse_blob(raw).unwrap()), day(18), Preferences::default());
    let state = &snap.user_state;

    assert_eq!(state.level, 5);
    assert_eq!(state.stats.current_streak, 3);
    assert_eq!(state.stats.history.len(), 1);
    assert_eq!(state.stats.history[0].date, day(17));
    assert_eq!(state.stats.history[0].completed_habit_ids, vec!["1", "2"]);
}

#[test]
fn test_mistyped_fields_read_as_absent() {
    let raw = r#"{
        "userState": { "level": "high", "stats": { "lastLoginDate": 7, "lastCompletionDate": false } },
        "achievements": [ { "id": "lvl_4", "unlocked": "yes" }, { "unlocked": true }, { "id": "str_3", "unlocked": true } ],
        "habits": "none",
        "language": 1
    }"#;
    let prefs = Preferences {
        language: Language::En,
        theme: Theme::Light,
    };
    let snap = merge_loaded(Some(parse_blob(raw).unwrap()), day(18), prefs);

    assert_eq!(snap.user_state.level, 1);
    assert_eq!(snap.user_state.stats.last_login_date, day(18));
    assert_eq!(snap.user_state.stats.last_completion_date, None);
    let unlocked: Vec<_> = snap.achievements.iter().filter(|a| a.unlocked).map(|a| a.id.as_str()).collect();
    assert_eq!(unlocked, vec!["str_3"]);
    assert_eq!(snap.habits.len(), 6);
    assert_eq!(snap.language, Language::En);
}

#[test]
fn test_corrupt_save_is_kept_beside_fresh_one() {
    let dir = tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "kept");
    let raw = "{\"userState\": {\"level\": 9,";
    fs::write(store.path(), raw).unwrap();
    let corrupt = store.corrupt_path();

    let (tracker, report) = Tracker::open(store, Preferences::default(), Duration::from_secs(2), day(18));

    assert_eq!(report.source, LoadSource::Defaults);
    assert_eq!(tracker.snapshot().user_state.level, 1);
    assert_eq!(fs::read_to_string(&corrupt).unwrap(), raw);
    assert!(dir.path().join("kept.json").exists());
}
