//! Achievement catalog and evaluator (v0.2.0).
//!
//! The catalog is pure data: 100 entries, 25 per category, regenerated on
//! every language change. Ids depend only on category and threshold, so the
//! unlocked set survives regeneration through [`UnlockOverlay`].

use crate::i18n::{fill, Language, Template};
use crate::state::UserState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

/// Entries generated per category
pub const PER_CATEGORY: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Level,
    Streak,
    Earlybird,
    Master,
}

impl AchievementCategory {
    pub const ALL: [AchievementCategory; 4] = [
        AchievementCategory::Level,
        AchievementCategory::Streak,
        AchievementCategory::Earlybird,
        AchievementCategory::Master,
    ];

    fn id_prefix(&self) -> &'static str {
        match self {
            AchievementCategory::Level => "lvl",
            AchievementCategory::Streak => "str",
            AchievementCategory::Earlybird => "early",
            AchievementCategory::Master => "zen",
        }
    }

    fn template(&self, language: Language) -> &'static Template {
        let strings = language.strings();
        match self {
            AchievementCategory::Level => &strings.level,
            AchievementCategory::Streak => &strings.streak_badge,
            AchievementCategory::Earlybird => &strings.earlybird,
            AchievementCategory::Master => &strings.master,
        }
    }

    /// Threshold for the i-th entry (1-based).
    pub fn threshold(&self, i: u32) -> u64 {
        let i = i as u64;
        match self {
            AchievementCategory::Level => 4 * i,
            // 3, 7, 12, 17, ...
            AchievementCategory::Streak => match i {
                0 | 1 => 3,
                _ => 7 + 5 * (i - 2),
            },
            // 1, 5, 10, 15, ...
            AchievementCategory::Earlybird => match i {
                0 | 1 => 1,
                _ => 5 * (i - 1),
            },
            AchievementCategory::Master => 50 * i,
        }
    }

    /// Title suffix: numeric threshold, or roman ordinal for the counted badges.
    fn title_value(&self, i: u32) -> String {
        match self {
            AchievementCategory::Level | AchievementCategory::Streak => self.threshold(i).to_string(),
            AchievementCategory::Earlybird | AchievementCategory::Master => romanize(i),
        }
    }

    /// The statistic this category is compared against.
    pub fn stat(&self, state: &UserState) -> u64 {
        match self {
            AchievementCategory::Level => state.level as u64,
            AchievementCategory::Streak => state.stats.current_streak as u64,
            AchievementCategory::Earlybird => state.stats.early_bird_count as u64,
            AchievementCategory::Master => state.stats.total_meditation_minutes,
        }
    }

    pub fn achievement_id(&self, threshold: u64) -> String {
        format!("{}_{}", self.id_prefix(), threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: AchievementCategory,
    pub target_value: u64,
    /// Only ever flips false -> true
    pub unlocked: bool,
}

impl Achievement {
    pub fn is_met_by(&self, state: &UserState) -> bool {
        self.category.stat(state) >= self.target_value
    }
}

/// Full catalog in display order, nothing unlocked.
pub fn generate(language: Language) -> Vec<Achievement> {
    let mut achievements = Vec::with_capacity((PER_CATEGORY as usize) * AchievementCategory::ALL.len());
    for category in AchievementCategory::ALL {
        let template = category.template(language);
        for i in 1..=PER_CATEGORY {
            let target = category.threshold(i);
            achievements.push(Achievement {
                id: category.achievement_id(target),
                title: fill(template.title, &category.title_value(i)),
                description: fill(template.description, &target.to_string()),
                category,
                target_value: target,
                unlocked: false,
            });
        }
    }
    achievements
}

/// Roman numeral for 1..=3999; other values render as decimal.
pub fn romanize(n: u32) -> String {
    if n == 0 || n >= 4000 {
        return n.to_string();
    }
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut rest = n;
    let mut out = String::new();
    for &(value, numeral) in TABLE.iter() {
        while rest >= value {
            out.push_str(numeral);
            rest -= value;
        }
    }
    out
}

/// Unlocked ids kept apart from the localized catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlockOverlay {
    ids: BTreeSet<String>,
}

impl UnlockOverlay {
    pub fn from_catalog(achievements: &[Achievement]) -> Self {
        Self::from_ids(achievements.iter().filter(|a| a.unlocked).map(|a| a.id.clone()))
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Mark matching catalog entries unlocked. Ids not in the catalog are ignored.
    pub fn apply(&self, mut catalog: Vec<Achievement>) -> Vec<Achievement> {
        for achievement in catalog.iter_mut() {
            if self.contains(&achievement.id) {
                achievement.unlocked = true;
            }
        }
        catalog
    }
}

/// Regenerate the catalog in `language`, keeping unlocked flags by id.
pub fn relocalize(current: &[Achievement], language: Language) -> Vec<Achievement> {
    UnlockOverlay::from_catalog(current).apply(generate(language))
}

/// Unlock every locked achievement whose threshold is met.
///
/// Returns the titles unlocked by this pass, in catalog order.
pub fn evaluate(achievements: &mut [Achievement], state: &UserState) -> Vec<String> {
    let mut unlocked = Vec::new();
    for achievement in achievements.iter_mut().filter(|a| !a.unlocked) {
        if achievement.is_met_by(state) {
            achievement.unlocked = true;
            info!(id = %achievement.id, "achievement unlocked");
            unlocked.push(achievement.title.clone());
        }
    }
    unlocked
}

/// Count of unlocked entries per category, in catalog order
pub fn summary(achievements: &[Achievement]) -> Vec<(AchievementCategory, usize, usize)> {
    AchievementCategory::ALL
        .iter()
        .map(|&category| {
            let in_category = achievements.iter().filter(|a| a.category == category);
            let total = in_category.clone().count();
            let unlocked = in_category.filter(|a| a.unlocked).count();
            (category, unlocked, total)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarDay;

    fn state() -> UserState {
        UserState::new(CalendarDay::from_ymd(2026, 10, 18).unwrap())
    }

    fn targets(catalog: &[Achievement], category: AchievementCategory) -> Vec<u64> {
        catalog
            .iter()
            .filter(|a| a.category == category)
            .map(|a| a.target_value)
            .collect()
    }

    #[test]
    fn test_catalog_size_and_order() {
        let catalog = generate(Language::En);
        assert_eq!(catalog.len(), 100);
        assert_eq!(catalog[0].id, "lvl_4");
        assert_eq!(catalog[24].id, "lvl_100");
        assert_eq!(catalog[25].id, "str_3");
        assert_eq!(catalog[50].id, "early_1");
        assert_eq!(catalog[75].id, "zen_50");
        assert!(catalog.iter().all(|a| !a.unlocked));
    }

    #[test]
    fn test_threshold_schedules() {
        let catalog = generate(Language::En);
        let streak = targets(&catalog, AchievementCategory::Streak);
        assert_eq!(&streak[..4], &[3, 7, 12, 17]);
        assert_eq!(streak[24], 122);

        let early = targets(&catalog, AchievementCategory::Earlybird);
        assert_eq!(&early[..4], &[1, 5, 10, 15]);
        assert_eq!(early[24], 120);

        let zen = targets(&catalog, AchievementCategory::Master);
        assert_eq!(zen[0], 50);
        assert_eq!(zen[24], 1250);
    }

    #[test]
    fn test_ids_stable_across_languages() {
        let en: Vec<_> = generate(Language::En).into_iter().map(|a| a.id).collect();
        let es: Vec<_> = generate(Language::Es).into_iter().map(|a| a.id).collect();
        assert_eq!(en, es);
        assert_eq!(en, generate(Language::En).into_iter().map(|a| a.id).collect::<Vec<_>>());

        let mut unique = en.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn test_titles() {
        let en = generate(Language::En);
        assert_eq!(en[2].title, "Level 12");
        assert_eq!(en[26].title, "7-Day Streak");
        assert_eq!(en[51].title, "Early Bird II");
        assert_eq!(en[51].description, "Finish a task before 8 AM 5 times");
        assert_eq!(en[78].title, "Zen Master IV");

        let es = generate(Language::Es);
        assert_eq!(es[26].title, "Racha de 7 Días");
        assert_eq!(es[51].title, "Madrugador II");
    }

    #[test]
    fn test_romanize() {
        assert_eq!(romanize(1), "I");
        assert_eq!(romanize(4), "IV");
        assert_eq!(romanize(9), "IX");
        assert_eq!(romanize(14), "XIV");
        assert_eq!(romanize(24), "XXIV");
        assert_eq!(romanize(25), "XXV");
        assert_eq!(romanize(1994), "MCMXCIV");
    }

    #[test]
    fn test_evaluate_unlocks_in_catalog_order() {
        let mut catalog = generate(Language::En);
        let mut s = state();
        s.level = 9;
        s.stats.early_bird_count = 5;

        let titles = evaluate(&mut catalog, &s);
        assert_eq!(titles, vec!["Level 4", "Level 8", "Early Bird I", "Early Bird II"]);

        // Already unlocked entries are not reported again
        assert!(evaluate(&mut catalog, &s).is_empty());
    }

    #[test]
    fn test_unlocked_is_monotonic() {
        let mut catalog = generate(Language::En);
        let mut s = state();
        s.stats.current_streak = 7;
        evaluate(&mut catalog, &s);

        s.stats.current_streak = 0;
        evaluate(&mut catalog, &s);
        let str_7 = catalog.iter().find(|a| a.id == "str_7").unwrap();
        assert!(str_7.unlocked);
    }

    #[test]
    fn test_relocalize_preserves_unlocks() {
        let mut catalog = generate(Language::En);
        let mut s = state();
        s.stats.total_meditation_minutes = 100;
        evaluate(&mut catalog, &s);

        let es = relocalize(&catalog, Language::Es);
        let zen: Vec<_> = es.iter().filter(|a| a.unlocked).map(|a| a.id.as_str()).collect();
        assert_eq!(zen, vec!["zen_50", "zen_100"]);
        assert_eq!(es[75].title, "Maestro Zen I");
    }

    #[test]
    fn test_overlay_ignores_unknown_ids() {
        let overlay = UnlockOverlay::from_ids(["lvl_4", "retired_badge"]);
        let catalog = overlay.apply(generate(Language::En));
        assert_eq!(catalog.iter().filter(|a| a.unlocked).count(), 1);
    }

    #[test]
    fn test_summary_counts() {
        let mut catalog = generate(Language::En);
        catalog[0].unlocked = true;
        let summary = summary(&catalog);
        assert_eq!(summary[0], (AchievementCategory::Level, 1, 25));
        assert_eq!(summary[3], (AchievementCategory::Master, 0, 25));
    }
}
