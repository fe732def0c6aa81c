//! Command handlers for ascendctl

use crate::display;
use anyhow::{bail, Context, Result};
use ascend_common::sync::{DirRemote, RemoteStore, Session};
use ascend_common::{AscendConfig, CalendarDay, Language, Theme, Tracker};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// One open session for the duration of a command
pub struct App {
    tracker: Tracker,
}

impl App {
    pub async fn start(config: &AscendConfig) -> Self {
        let today = CalendarDay::today();
        let (mut tracker, report) = Tracker::open(
            config.local_store(),
            config.preferences(),
            config.debounce(),
            today,
        );
        display::load_report(&report, tracker.snapshot().language);

        if let Some((user_id, dir)) = config.remote_target() {
            let remote: Arc<dyn RemoteStore> = Arc::new(DirRemote::new(dir));
            let report = tracker.sign_in(Session::new(user_id), remote, today).await;
            display::load_report(&report, tracker.snapshot().language);
        }

        Self { tracker }
    }

    /// Push anything still waiting on the debounce window.
    pub async fn finish(mut self) {
        if !self.tracker.has_pending_sync() {
            return;
        }
        match self.tracker.flush().await {
            Ok(()) => debug!("remote copy updated"),
            Err(e) => warn!(error = %e, "could not update remote copy, local save kept"),
        }
    }
}

pub fn status(app: &App) -> Result<()> {
    let status = *app.tracker.sync_status().borrow();
    display::status(app.tracker.snapshot(), status);
    Ok(())
}

pub fn habits(app: &App) -> Result<()> {
    display::habits(app.tracker.snapshot());
    Ok(())
}

pub fn increment(app: &mut App, habit_id: &str) -> Result<()> {
    let Some(habit) = app.tracker.snapshot().habits.iter().find(|h| h.id == habit_id) else {
        bail!("Unknown habit: '{}'. Valid ids: 1-6", habit_id);
    };
    if habit.is_complete() {
        display::already_done(habit, app.tracker.snapshot().language);
        return Ok(());
    }

    let now = Local::now().naive_local();
    match app.tracker.increment(habit_id, now) {
        Some(report) => {
            if let Some(rollover) = &report.rollover {
                display::load_report(rollover, app.tracker.snapshot().language);
            }
            display::action(&report, app.tracker.snapshot());
        }
        None => debug!(habit = habit_id, "increment was a no-op"),
    }
    Ok(())
}

pub fn history(app: &App) -> Result<()> {
    display::history(app.tracker.history(), app.tracker.snapshot().language);
    Ok(())
}

pub fn achievements(app: &App, all: bool) -> Result<()> {
    display::achievements(&app.tracker.snapshot().achievements, all);
    Ok(())
}

pub fn language(app: &mut App, value: &str) -> Result<()> {
    let language: Language = value.parse()?;
    app.tracker.set_language(language);
    println!("{}", language.strings().app_title);
    Ok(())
}

pub fn theme(app: &mut App, value: Option<&str>) -> Result<()> {
    let theme = match value {
        Some(raw) => {
            let theme: Theme = raw.parse()?;
            app.tracker.set_theme(theme);
            theme
        }
        None => app.tracker.toggle_theme(),
    };
    println!("theme: {}", theme);
    Ok(())
}

/// Show config, or apply `key=value` and save it back.
pub fn config(mut config: AscendConfig, path: Option<&Path>, set: Option<&str>) -> Result<()> {
    let Some(assignment) = set else {
        print!("{}", toml_render(&config)?);
        return Ok(());
    };

    let (key, value) = assignment
        .split_once('=')
        .with_context(|| format!("Expected key=value, got '{}'", assignment))?;
    match key.trim() {
        "language" | "defaults.language" => config.set_language(value)?,
        "theme" | "defaults.theme" => config.set_theme(value)?,
        "debounce_ms" | "sync.debounce_ms" => {
            config.sync.debounce_ms = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid debounce_ms: '{}'", value))?;
        }
        other => bail!("Unknown config key: '{}'. Valid keys: language, theme, debounce_ms", other),
    }

    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    println!("{} = {}", key.trim(), value.trim());
    Ok(())
}

fn toml_render(config: &AscendConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}
