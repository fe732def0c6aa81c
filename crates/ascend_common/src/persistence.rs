//! Persistence merge layer (v0.3.0).
//!
//! Turns whatever blob storage hands back (current schema, an older schema
//! with missing fields, or nothing at all) into a complete [`Snapshot`], and
//! serializes a snapshot back into the blob shape shared by local and
//! remote storage:
//!
//! ```text
//! { userState, achievements, habits, theme, language }
//! ```
//!
//! Rules:
//! - Missing stat fields fall back to defaults; `lastLoginDate` to today.
//! - `xpToNextLevel` is always recomputed from `level`.
//! - Achievements are rebuilt from the catalog; only `id` + `unlocked` are read.
//! - Habits are rebuilt from the catalog; stored progress is laid over by id.

use crate::achievements::{self, Achievement, AchievementCategory, UnlockOverlay};
use crate::calendar::CalendarDay;
use crate::error::AscendError;
use crate::habits::{self, Habit};
use crate::i18n::{Language, Theme};
use crate::progression::{xp_for_next_level, MAX_LEVEL};
use crate::state::{HistoryEntry, UserState, UserStats};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

// ============================================================================
// Saved blob schema (lenient on read)
// ============================================================================

// Every field reads through a tolerant deserializer: a value of the wrong
// type degrades to "absent" instead of failing the whole document.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBlob {
    #[serde(default, deserialize_with = "lenient_section", skip_serializing_if = "Option::is_none")]
    pub user_state: Option<SavedUserState>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<SavedAchievement>>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Option::is_none")]
    pub habits: Option<Vec<SavedHabit>>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedUserState {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub level: Option<u32>,
    #[serde(default, rename = "currentXP", deserialize_with = "lenient_u64")]
    pub current_xp: Option<u64>,
    /// Written for readers of the blob; never trusted on load
    #[serde(default, deserialize_with = "lenient_u64")]
    pub xp_to_next_level: Option<u64>,
    #[serde(default, deserialize_with = "lenient_section")]
    pub stats: Option<SavedStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStats {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_meditation_minutes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_day")]
    pub last_login_date: Option<CalendarDay>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub current_streak: Option<u32>,
    #[serde(default, deserialize_with = "lenient_day")]
    pub last_completion_date: Option<CalendarDay>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub early_bird_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub history: Option<Vec<SavedHistoryEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedHistoryEntry {
    /// Empty when the stored value is not a string; such entries are dropped on merge
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_ids")]
    pub completed_habit_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAchievement {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub unlocked: bool,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_section", skip_serializing_if = "Option::is_none")]
    pub category: Option<AchievementCategory>,
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub target_value: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedHabit {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub current: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub target: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub increment_value: Option<u32>,
}

/// Non-negative whole number from a JSON number or numeric string.
/// Negatives clamp to zero, fractions round to the nearest integer.
fn count_of(value: &Value) -> Option<u64> {
    let from_float = |f: f64| f.is_finite().then(|| f.max(0.0).round() as u64);
    match value {
        Value::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(v), _) => Some(v),
            (None, Some(_)) => Some(0),
            (None, None) => n.as_f64().and_then(from_float),
        },
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(from_float),
        _ => None,
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(count_of(&raw))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(count_of(&raw).map(|n| u32::try_from(n).unwrap_or(u32::MAX)))
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// Catalog ids are strings, but a bare number names the same entry
fn id_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_of(Value::deserialize(deserializer)?).ok_or_else(|| de::Error::custom("id must be a string"))
}

fn lenient_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.into_iter().filter_map(id_of).collect()),
        _ => Ok(Vec::new()),
    }
}

/// Unparseable, empty or non-string dates read as absent
fn lenient_day<'de, D>(deserializer: D) -> Result<Option<CalendarDay>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.as_deref().and_then(CalendarDay::parse))
}

/// A nested object that does not fit its schema reads as absent
fn lenient_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(raw) {
        Ok(section) => Ok(Some(section)),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable saved section");
            Ok(None)
        }
    }
}

/// Keep the readable elements of a saved list, drop the rest
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if kept.len() < total {
        warn!(dropped = total - kept.len(), "dropping unreadable saved entries");
    }
    Ok(Some(kept))
}

// ============================================================================
// In-memory snapshot
// ============================================================================

/// Everything that gets persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub user_state: UserState,
    pub habits: Vec<Habit>,
    pub achievements: Vec<Achievement>,
    pub theme: Theme,
    pub language: Language,
}

impl Snapshot {
    /// First-run state
    pub fn fresh(today: CalendarDay, language: Language, theme: Theme) -> Self {
        Self {
            user_state: UserState::new(today),
            habits: habits::default_habits(language),
            achievements: achievements::generate(language),
            theme,
            language,
        }
    }
}

/// Fallbacks used when the blob does not say
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preferences {
    pub language: Language,
    pub theme: Theme,
}

/// Parse a stored blob.
pub fn parse_blob(raw: &str) -> Result<SavedBlob, AscendError> {
    Ok(serde_json::from_str(raw)?)
}

/// Build a complete snapshot from a possibly partial blob.
pub fn merge_loaded(blob: Option<SavedBlob>, today: CalendarDay, prefs: Preferences) -> Snapshot {
    let Some(blob) = blob else {
        debug!("no saved blob, starting from defaults");
        return Snapshot::fresh(today, prefs.language, prefs.theme);
    };

    let language = match blob.language.as_deref() {
        Some(raw) => Language::parse(raw).unwrap_or_else(|| {
            warn!(language = raw, "unknown saved language, using default");
            prefs.language
        }),
        None => prefs.language,
    };
    let theme = match blob.theme.as_deref() {
        Some(raw) => Theme::parse(raw).unwrap_or_else(|| {
            warn!(theme = raw, "unknown saved theme, using default");
            prefs.theme
        }),
        None => prefs.theme,
    };

    let user_state = match blob.user_state {
        Some(saved) => merge_user_state(saved, today),
        None => UserState::new(today),
    };

    let catalog = achievements::generate(language);
    let achievements = match blob.achievements {
        Some(saved) => {
            let overlay = UnlockOverlay::from_ids(saved.into_iter().filter(|a| a.unlocked).map(|a| a.id));
            overlay.apply(catalog)
        }
        None => catalog,
    };

    let habits = match blob.habits {
        Some(saved) => merge_habits(saved, language),
        None => habits::default_habits(language),
    };

    Snapshot {
        user_state,
        habits,
        achievements,
        theme,
        language,
    }
}

fn merge_user_state(saved: SavedUserState, today: CalendarDay) -> UserState {
    let level = saved.level.unwrap_or(1).clamp(1, MAX_LEVEL);
    let stats = saved.stats.unwrap_or_default();

    let history = stats
        .history
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| match CalendarDay::parse(&entry.date) {
            Some(date) => Some(HistoryEntry {
                date,
                completed_habit_ids: entry.completed_habit_ids,
            }),
            None => {
                warn!(date = %entry.date, "dropping history entry with unreadable date");
                None
            }
        })
        .collect();

    UserState {
        level,
        current_xp: saved.current_xp.unwrap_or(0),
        xp_to_next_level: xp_for_next_level(level),
        stats: UserStats {
            total_meditation_minutes: stats.total_meditation_minutes.unwrap_or(0),
            last_login_date: stats.last_login_date.unwrap_or(today),
            current_streak: stats.current_streak.unwrap_or(0),
            last_completion_date: stats.last_completion_date,
            early_bird_count: stats.early_bird_count.unwrap_or(0),
            history,
        },
    }
}

fn merge_habits(saved: Vec<SavedHabit>, language: Language) -> Vec<Habit> {
    let mut merged = habits::default_habits(language);
    for habit in merged.iter_mut() {
        if let Some(stored) = saved.iter().find(|s| s.id == habit.id) {
            // zero would leave a habit permanently complete or stuck
            if let Some(target) = stored.target.filter(|t| *t > 0) {
                habit.target = target;
            }
            if let Some(increment) = stored.increment_value.filter(|i| *i > 0) {
                habit.increment_value = increment;
            }
            habit.current = stored.current.unwrap_or(0);
        }
    }
    for stored in saved.iter().filter(|s| !merged.iter().any(|h| h.id == s.id)) {
        debug!(habit = %stored.id, "ignoring saved habit missing from catalog");
    }
    merged
}

/// Serialize a snapshot into the stored shape.
pub fn to_blob(snapshot: &Snapshot) -> SavedBlob {
    let state = &snapshot.user_state;
    SavedBlob {
        user_state: Some(SavedUserState {
            level: Some(state.level),
            current_xp: Some(state.current_xp),
            xp_to_next_level: Some(state.xp_to_next_level),
            stats: Some(SavedStats {
                total_meditation_minutes: Some(state.stats.total_meditation_minutes),
                last_login_date: Some(state.stats.last_login_date),
                current_streak: Some(state.stats.current_streak),
                last_completion_date: state.stats.last_completion_date,
                early_bird_count: Some(state.stats.early_bird_count),
                history: Some(
                    state
                        .stats
                        .history
                        .iter()
                        .map(|entry| SavedHistoryEntry {
                            date: entry.date.to_string(),
                            completed_habit_ids: entry.completed_habit_ids.clone(),
                        })
                        .collect(),
                ),
            }),
        }),
        achievements: Some(
            snapshot
                .achievements
                .iter()
                .map(|a| SavedAchievement {
                    id: a.id.clone(),
                    unlocked: a.unlocked,
                    title: Some(a.title.clone()),
                    description: Some(a.description.clone()),
                    category: Some(a.category),
                    target_value: Some(a.target_value),
                })
                .collect(),
        ),
        habits: Some(
            snapshot
                .habits
                .iter()
                .map(|h| SavedHabit {
                    id: h.id.clone(),
                    title: Some(h.title.clone()),
                    unit: Some(h.unit.clone()),
                    current: Some(h.current),
                    target: Some(h.target),
                    increment_value: Some(h.increment_value),
                })
                .collect(),
        ),
        theme: Some(snapshot.theme.as_str().to_string()),
        language: Some(snapshot.language.as_str().to_string()),
    }
}

pub fn to_json(snapshot: &Snapshot) -> Result<String, AscendError> {
    Ok(serde_json::to_string_pretty(&to_blob(snapshot))?)
}
