//! Ascend Common - Gamification core for Daily Ascensions v0.3.0
//!
//! XP and levels, the achievement catalog, daily reconciliation, streaks,
//! persistence merging and debounced remote sync. Every reducer is a plain
//! function over owned state; [`tracker::Tracker`] wires them into a session.

pub mod achievements;
pub mod calendar;
pub mod config;
pub mod error;
pub mod habits;
pub mod i18n;
pub mod persistence;
pub mod progression;
pub mod reconcile;
pub mod state;
pub mod store;
pub mod sync;
pub mod tracker;

pub use calendar::CalendarDay;
pub use config::AscendConfig;
pub use error::AscendError;
pub use i18n::{Language, Theme};
pub use state::{HistoryEntry, UserState, UserStats};
pub use tracker::{ActionReport, LoadReport, LoadSource, Tracker};
