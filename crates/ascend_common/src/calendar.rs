//! Calendar-day identity (v0.1.0).
//!
//! Login, completion and history dates are whole local calendar days with no
//! time-of-day or offset attached. They are written the way the web client
//! rendered them ("Sat Oct 18 2026"), so two saved days compare by plain
//! equality and never drift across timezones.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const DISPLAY_FORMAT: &str = "%a %b %d %Y";
const ISO_FORMAT: &str = "%Y-%m-%d";

/// A date-only identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Current local calendar day.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Previous calendar day (calendar arithmetic, never 24h subtraction).
    pub fn yesterday(&self) -> Self {
        self.0.pred_opt().map(Self).unwrap_or(*self)
    }

    pub fn add_days(&self, days: u64) -> Self {
        self.0
            .checked_add_days(Days::new(days))
            .map(Self)
            .unwrap_or(*self)
    }

    /// Signed number of days from `earlier` to `self`.
    pub fn days_since(&self, earlier: CalendarDay) -> i64 {
        (self.0 - earlier.0).num_days()
    }

    /// Parse either the display form or an ISO date.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, DISPLAY_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(s, ISO_FORMAT))
            .ok()
            .map(Self)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DISPLAY_FORMAT))
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CalendarDay::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized calendar day: {raw}")))
    }
}
