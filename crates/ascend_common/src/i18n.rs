//! Display language, theme and the string tables behind them.
//!
//! Only identifiers are stable; every string here may change between
//! releases, which is why saved titles are never trusted on load.

use crate::error::AscendError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    /// New installs start in Spanish.
    #[default]
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "es" | "spanish" | "español" => Some(Language::Es),
            _ => None,
        }
    }

    pub fn strings(&self) -> &'static Strings {
        match self {
            Language::En => &EN,
            Language::Es => &ES,
        }
    }
}

impl FromStr for Language {
    type Err = AscendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| AscendError::Config(format!("invalid language '{}', expected en or es", s)))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = AscendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::parse(s).ok_or_else(|| AscendError::Config(format!("invalid theme '{}', expected light or dark", s)))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title/description pair with a single `{0}` placeholder
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub title: &'static str,
    pub description: &'static str,
}

/// Localized habit label
#[derive(Debug, Clone, Copy)]
pub struct HabitLabel {
    pub id: &'static str,
    pub title: &'static str,
    pub unit: &'static str,
}

/// Per-language string table
#[derive(Debug)]
pub struct Strings {
    pub app_title: &'static str,
    pub level_up: &'static str,
    pub level_reached: &'static str,
    pub achievement_unlocked: &'static str,
    pub streak: &'static str,
    pub days: &'static str,
    pub done: &'static str,
    pub no_history: &'static str,
    pub habits: [HabitLabel; 6],
    pub level: Template,
    pub streak_badge: Template,
    pub earlybird: Template,
    pub master: Template,
}

impl Strings {
    pub fn habit(&self, id: &str) -> Option<&HabitLabel> {
        self.habits.iter().find(|h| h.id == id)
    }
}

/// Replace the first `{0}` placeholder.
pub fn fill(template: &str, value: &str) -> String {
    template.replacen("{0}", value, 1)
}

static EN: Strings = Strings {
    app_title: "Daily Ascensions",
    level_up: "Level Up!",
    level_reached: "You reached Level",
    achievement_unlocked: "Achievement Unlocked!",
    streak: "Streak",
    days: "Days",
    done: "DONE",
    no_history: "No history yet. Start completing habits!",
    habits: [
        HabitLabel { id: "1", title: "Drink Water", unit: "Glasses" },
        HabitLabel { id: "2", title: "Read Books", unit: "Pages" },
        HabitLabel { id: "3", title: "Meditate", unit: "Minutes" },
        HabitLabel { id: "4", title: "Workout", unit: "Mins" },
        HabitLabel { id: "5", title: "Journal", unit: "Entry" },
        HabitLabel { id: "6", title: "Walk", unit: "Steps" },
    ],
    level: Template { title: "Level {0}", description: "Reach Level {0}" },
    streak_badge: Template {
        title: "{0}-Day Streak",
        description: "Maintain a streak for {0} days",
    },
    earlybird: Template {
        title: "Early Bird {0}",
        description: "Finish a task before 8 AM {0} times",
    },
    master: Template {
        title: "Zen Master {0}",
        description: "Meditate for {0} total minutes",
    },
};

static ES: Strings = Strings {
    app_title: "Ascensos Diarios",
    level_up: "¡Subiste de Nivel!",
    level_reached: "Alcanzaste el Nivel",
    achievement_unlocked: "¡Logro Desbloqueado!",
    streak: "Racha",
    days: "Días",
    done: "LISTO",
    no_history: "Aún no hay historial. ¡Completa hábitos!",
    habits: [
        HabitLabel { id: "1", title: "Beber Agua", unit: "Vasos" },
        HabitLabel { id: "2", title: "Leer Libros", unit: "Páginas" },
        HabitLabel { id: "3", title: "Meditar", unit: "Minutos" },
        HabitLabel { id: "4", title: "Entrenar", unit: "Min" },
        HabitLabel { id: "5", title: "Diario", unit: "Entrada" },
        HabitLabel { id: "6", title: "Caminar", unit: "Pasos" },
    ],
    level: Template { title: "Nivel {0}", description: "Alcanza el Nivel {0}" },
    streak_badge: Template {
        title: "Racha de {0} Días",
        description: "Mantén una racha de {0} días",
    },
    earlybird: Template {
        title: "Madrugador {0}",
        description: "Termina una tarea antes de las 8 AM {0} veces",
    },
    master: Template {
        title: "Maestro Zen {0}",
        description: "Medita por {0} minutos en total",
    },
};
