//! Session controller (v0.3.0).
//!
//! Owns the in-memory [`Snapshot`] and routes every user action through the
//! pure reducers: increment -> XP -> stats -> streak -> achievements. After
//! each change the snapshot is written to local storage and, when signed
//! in, handed to the debounced remote writer.
//!
//! When signed in, mutating calls must run inside a Tokio runtime because
//! the remote writer spawns its timer task there.

use crate::achievements;
use crate::calendar::CalendarDay;
use crate::error::AscendError;
use crate::habits;
use crate::i18n::{Language, Theme};
use crate::persistence::{self, Preferences, SavedBlob, Snapshot};
use crate::progression::apply_xp;
use crate::reconcile::{reconcile, DayTransition};
use crate::state::{on_all_habits_completed, HistoryEntry};
use crate::store::LocalStore;
use crate::sync::{DebouncedWriter, RemoteStore, Session, SyncStatus};
use chrono::{NaiveDateTime, Timelike};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where the active snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Defaults,
    Local,
    Remote,
}

/// What happened while bringing a snapshot up to date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: LoadSource,
    pub transition: DayTransition,
    pub archived: Option<HistoryEntry>,
    /// Titles unlocked by the post-load evaluation
    pub unlocked: Vec<String>,
}

impl LoadReport {
    fn unchanged(source: LoadSource) -> Self {
        Self {
            source,
            transition: DayTransition::SameDay,
            archived: None,
            unlocked: Vec::new(),
        }
    }

    fn changed_state(&self) -> bool {
        self.transition.is_new_day() || !self.unlocked.is_empty()
    }
}

/// Result of one successful increment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionReport {
    pub habit_id: String,
    pub new_value: u32,
    pub xp_awarded: u64,
    /// New level when this action crossed at least one threshold
    pub leveled_up_to: Option<u32>,
    pub early_bird: bool,
    pub all_complete: bool,
    pub streak_advanced: bool,
    /// Newly unlocked achievement titles, catalog order
    pub unlocked: Vec<String>,
    /// Day boundary crossed before the action was applied
    pub rollover: Option<LoadReport>,
}

impl ActionReport {
    /// The unlock worth surfacing to the user (the last one)
    pub fn headline(&self) -> Option<&str> {
        self.unlocked.last().map(String::as_str)
    }
}

/// Merge, reconcile and evaluate a loaded blob for `today`.
pub fn restore(blob: Option<SavedBlob>, today: CalendarDay, prefs: Preferences) -> (Snapshot, LoadReport) {
    let source = if blob.is_some() { LoadSource::Local } else { LoadSource::Defaults };
    let mut snapshot = persistence::merge_loaded(blob, today, prefs);

    let reconciled = reconcile(snapshot.user_state, snapshot.habits, today);
    snapshot.user_state = reconciled.state;
    snapshot.habits = reconciled.habits;

    let unlocked = achievements::evaluate(&mut snapshot.achievements, &snapshot.user_state);

    let report = LoadReport {
        source,
        transition: reconciled.transition,
        archived: reconciled.archived,
        unlocked,
    };
    (snapshot, report)
}

struct RemoteLink {
    session: Session,
    writer: DebouncedWriter,
}

pub struct Tracker {
    snapshot: Snapshot,
    local: LocalStore,
    prefs: Preferences,
    debounce: Duration,
    remote: Option<RemoteLink>,
    status: watch::Sender<SyncStatus>,
}

impl Tracker {
    /// Load the local save (or defaults) and reconcile it for `today`.
    pub fn open(local: LocalStore, prefs: Preferences, debounce: Duration, today: CalendarDay) -> (Self, LoadReport) {
        let (snapshot, report) = restore(local.load(), today, prefs);
        info!(
            source = ?report.source,
            transition = ?report.transition,
            level = snapshot.user_state.level,
            "session opened"
        );

        let (status, _) = watch::channel(SyncStatus::LocalOnly);
        let mut tracker = Self {
            snapshot,
            local,
            prefs,
            debounce,
            remote: None,
            status,
        };
        tracker.persist();
        (tracker, report)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// History, newest first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.snapshot.user_state.stats.history
    }

    pub fn session(&self) -> Option<&Session> {
        self.remote.as_ref().map(|link| &link.session)
    }

    pub fn sync_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn has_pending_sync(&self) -> bool {
        self.remote.as_ref().is_some_and(|link| link.writer.has_pending())
    }

    /// Re-run reconciliation, for sessions left open across midnight.
    pub fn refresh_day(&mut self, today: CalendarDay) -> LoadReport {
        if self.snapshot.user_state.stats.last_login_date == today {
            return LoadReport::unchanged(LoadSource::Local);
        }
        let reconciled = reconcile(
            self.snapshot.user_state.clone(),
            std::mem::take(&mut self.snapshot.habits),
            today,
        );
        self.snapshot.user_state = reconciled.state;
        self.snapshot.habits = reconciled.habits;
        let unlocked = achievements::evaluate(&mut self.snapshot.achievements, &self.snapshot.user_state);
        self.persist();
        LoadReport {
            source: LoadSource::Local,
            transition: reconciled.transition,
            archived: reconciled.archived,
            unlocked,
        }
    }

    /// Apply one increment to `habit_id` at local time `now`.
    ///
    /// Returns `None` for unknown habits or habits already at target. An
    /// unknown id does not trigger the day rollover.
    pub fn increment(&mut self, habit_id: &str, now: NaiveDateTime) -> Option<ActionReport> {
        if !self.snapshot.habits.iter().any(|h| h.id == habit_id) {
            debug!(habit = habit_id, "unknown habit");
            return None;
        }
        let today = CalendarDay::new(now.date());
        let rollover = self.refresh_day(today);

        let outcome = habits::increment(&mut self.snapshot.habits, habit_id, now.hour())?;

        let xp = apply_xp(self.snapshot.user_state.clone(), outcome.xp_awarded);
        let mut state = xp.state;
        state.stats.total_meditation_minutes += outcome.meditation_delta;
        if outcome.early_bird {
            state.stats.early_bird_count += 1;
        }

        let mut streak_advanced = false;
        if outcome.all_complete {
            let before = state.stats.current_streak;
            state = on_all_habits_completed(state, today);
            streak_advanced = state.stats.current_streak > before;
        }

        let unlocked = achievements::evaluate(&mut self.snapshot.achievements, &state);
        self.snapshot.user_state = state;
        self.persist();

        debug!(
            habit = habit_id,
            value = outcome.new_value,
            xp = self.snapshot.user_state.current_xp,
            "habit incremented"
        );

        Some(ActionReport {
            habit_id: outcome.habit_id,
            new_value: outcome.new_value,
            xp_awarded: outcome.xp_awarded,
            leveled_up_to: xp.leveled_up.then_some(self.snapshot.user_state.level),
            early_bird: outcome.early_bird,
            all_complete: outcome.all_complete,
            streak_advanced,
            unlocked,
            rollover: rollover.transition.is_new_day().then_some(rollover),
        })
    }

    /// Switch display language; unlocked achievements carry over by id.
    pub fn set_language(&mut self, language: Language) {
        if self.snapshot.language == language {
            return;
        }
        self.snapshot.language = language;
        self.snapshot.achievements = achievements::relocalize(&self.snapshot.achievements, language);
        habits::localize(&mut self.snapshot.habits, language);
        self.persist();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.snapshot.theme == theme {
            return;
        }
        self.snapshot.theme = theme;
        self.persist();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.snapshot.theme.toggled();
        self.set_theme(theme);
        theme
    }

    /// Link a remote store for `session`.
    ///
    /// Remote data, when present, replaces the local snapshot. Otherwise the
    /// local snapshot stays authoritative and is uploaded after the debounce
    /// window. A failed load keeps local state and still links the store so
    /// later changes are pushed.
    pub async fn sign_in(&mut self, session: Session, remote: Arc<dyn RemoteStore>, today: CalendarDay) -> LoadReport {
        self.sign_out();

        let mut writer = DebouncedWriter::new(
            Arc::clone(&remote),
            session.user_id.clone(),
            self.debounce,
            self.status.clone(),
        );

        let report = match remote.load(&session.user_id).await {
            Ok(Some(blob)) => {
                let (snapshot, mut report) = restore(Some(blob), today, self.prefs);
                report.source = LoadSource::Remote;
                self.snapshot = snapshot;
                self.save_local();
                if report.changed_state() {
                    writer.schedule(persistence::to_blob(&self.snapshot));
                } else {
                    self.status.send_replace(SyncStatus::Synced);
                }
                report
            }
            Ok(None) => {
                info!(user = %session.user_id, "no remote data, uploading local snapshot");
                writer.schedule(persistence::to_blob(&self.snapshot));
                LoadReport::unchanged(LoadSource::Local)
            }
            Err(e) => {
                warn!(user = %session.user_id, error = %e, "remote load failed, continuing with local data");
                self.status.send_replace(SyncStatus::Failed);
                LoadReport::unchanged(LoadSource::Local)
            }
        };

        info!(user = %session.user_id, source = ?report.source, "signed in");
        self.remote = Some(RemoteLink { session, writer });
        report
    }

    /// Drop the remote link, cancelling any pending write.
    pub fn sign_out(&mut self) {
        if let Some(mut link) = self.remote.take() {
            if link.writer.cancel() {
                debug!(user = %link.session.user_id, "pending remote write cancelled on sign-out");
            }
            info!(user = %link.session.user_id, "signed out");
        }
        self.status.send_replace(SyncStatus::LocalOnly);
    }

    /// React to an auth change notification.
    pub async fn apply_auth_change(
        &mut self,
        session: Option<Session>,
        remote: Arc<dyn RemoteStore>,
        today: CalendarDay,
    ) -> Option<LoadReport> {
        match session {
            Some(s) if self.session().map(|cur| cur.user_id == s.user_id).unwrap_or(false) => None,
            Some(s) => Some(self.sign_in(s, remote, today).await),
            None => {
                self.sign_out();
                None
            }
        }
    }

    /// Push the current snapshot now instead of waiting for the window.
    pub async fn flush(&mut self) -> Result<(), AscendError> {
        let blob = persistence::to_blob(&self.snapshot);
        match self.remote.as_mut() {
            Some(link) => Ok(link.writer.flush(&blob).await?),
            None => Err(AscendError::NotSignedIn),
        }
    }

    fn save_local(&self) {
        if let Err(e) = self.local.save(&persistence::to_blob(&self.snapshot)) {
            warn!(path = %self.local.path().display(), error = %e, "failed to write local save");
        }
    }

    fn persist(&mut self) {
        self.save_local();
        if let Some(link) = self.remote.as_mut() {
            link.writer.schedule(persistence::to_blob(&self.snapshot));
        }
    }
}
