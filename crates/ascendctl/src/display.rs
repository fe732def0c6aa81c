//! Plain-text rendering for ascendctl (v0.3.0).
//!
//! ASCII only. Color marks state (done, unlocked, failed) and is never the
//! only carrier of it.

use ascend_common::achievements::{summary, Achievement, AchievementCategory};
use ascend_common::habits::Habit;
use ascend_common::i18n::fill;
use ascend_common::persistence::Snapshot;
use ascend_common::reconcile::DayTransition;
use ascend_common::sync::SyncStatus;
use ascend_common::{ActionReport, HistoryEntry, Language, LoadReport};
use owo_colors::OwoColorize;

const BAR_WIDTH: usize = 30;
const HR: &str = "------------------------------------------------------------";

fn bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "=".repeat(filled).green(), "-".repeat(width - filled).dimmed())
}

fn category_label(category: AchievementCategory) -> &'static str {
    match category {
        AchievementCategory::Level => "level",
        AchievementCategory::Streak => "streak",
        AchievementCategory::Earlybird => "earlybird",
        AchievementCategory::Master => "master",
    }
}

/// Report what happened while the save was brought up to date
pub fn load_report(report: &LoadReport, language: Language) {
    let strings = language.strings();
    if let Some(entry) = &report.archived {
        eprintln!("{} {}: {}", "archived".dimmed(), entry.date, entry.completed_habit_ids.join(", "));
    }
    if let DayTransition::StreakBroken { .. } = report.transition {
        eprintln!("{}: 0 {}", strings.streak.yellow(), strings.days);
    }
    for title in &report.unlocked {
        eprintln!("{} {}", strings.achievement_unlocked.bright_yellow(), title);
    }
}

pub fn status(snapshot: &Snapshot, sync: SyncStatus) {
    let strings = snapshot.language.strings();
    let state = &snapshot.user_state;

    println!("\n{}", strings.app_title.bold());
    println!("{}", HR.dimmed());

    let level = fill(strings.level.title, &state.level.to_string());
    if state.is_max_level() {
        println!("  {}  {} XP", level.cyan(), state.current_xp);
    } else {
        println!(
            "  {}  {} {}/{} XP",
            level.cyan(),
            bar(state.progress_ratio(), BAR_WIDTH),
            state.current_xp,
            state.xp_to_next_level
        );
    }
    println!(
        "  {}: {} {}",
        strings.streak,
        state.stats.current_streak.to_string().bright_yellow(),
        strings.days
    );

    let sync_label = match sync {
        SyncStatus::Failed => sync.label().bright_red().to_string(),
        SyncStatus::Synced => sync.label().green().to_string(),
        _ => sync.label().dimmed().to_string(),
    };
    println!("  sync: {}", sync_label);
    println!();
}

pub fn habits(snapshot: &Snapshot) {
    let strings = snapshot.language.strings();
    for habit in &snapshot.habits {
        let marker = if habit.is_complete() {
            format!("[{}]", strings.done).green().to_string()
        } else {
            format!("+{}", habit.increment_value)
        };
        println!(
            "  {}  {:14} {} {:>5}/{:<5} {}  {}",
            habit.id.dimmed(),
            habit.title,
            bar(habit.current as f64 / habit.target.max(1) as f64, 10),
            habit.current,
            habit.target,
            habit.unit,
            marker
        );
    }
}

pub fn already_done(habit: &Habit, language: Language) {
    println!("{} {}", habit.title, format!("[{}]", language.strings().done).green());
}

/// Print the outcome of one increment, notifications last
pub fn action(report: &ActionReport, snapshot: &Snapshot) {
    let strings = snapshot.language.strings();
    let habit = snapshot.habits.iter().find(|h| h.id == report.habit_id);
    if let Some(habit) = habit {
        println!(
            "{} {}/{} {}  {}",
            habit.title,
            report.new_value,
            habit.target,
            habit.unit,
            format!("+{} XP", report.xp_awarded).green()
        );
    }

    if report.streak_advanced {
        println!(
            "{}: {} {}",
            strings.streak,
            snapshot.user_state.stats.current_streak.to_string().bright_yellow(),
            strings.days
        );
    }
    if let Some(level) = report.leveled_up_to {
        println!("{} {} {}", strings.level_up.bold().cyan(), strings.level_reached, level);
    }
    if let Some(title) = report.headline() {
        println!("{} {}", strings.achievement_unlocked.bold().bright_yellow(), title);
    }
}

pub fn history(entries: &[HistoryEntry], language: Language) {
    let strings = language.strings();
    if entries.is_empty() {
        println!("{}", strings.no_history.dimmed());
        return;
    }
    for entry in entries {
        let titles: Vec<&str> = entry
            .completed_habit_ids
            .iter()
            .map(|id| strings.habit(id).map(|h| h.title).unwrap_or(id.as_str()))
            .collect();
        println!("  {}  {}", entry.date.to_string().cyan(), titles.join(", "));
    }
}

pub fn achievements(list: &[Achievement], all: bool) {
    for (category, unlocked, total) in summary(list) {
        println!("  {:10} {:>3}/{}", category_label(category), unlocked, total);
    }
    println!("{}", HR.dimmed());
    for achievement in list.iter().filter(|a| all || a.unlocked) {
        if achievement.unlocked {
            println!("  {} {}  {}", "[x]".green(), achievement.title, achievement.description.dimmed());
        } else {
            println!("  [ ] {}  {}", achievement.title.dimmed(), achievement.description.dimmed());
        }
    }
}
