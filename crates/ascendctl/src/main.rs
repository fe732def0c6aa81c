//! Ascend Control - terminal host for Daily Ascensions
//!
//! Opens the local save, applies one command and exits. When sync is
//! configured any pending remote write is flushed before exit.

mod commands;
mod display;

use anyhow::Result;
use ascend_common::AscendConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "ASCEND_LOG";

#[derive(Parser)]
#[command(name = "ascendctl")]
#[command(about = "Daily Ascensions - habit tracking with levels and achievements", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of the default lookup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change configuration defaults
    Config {
        /// Set a configuration value (key=value)
        #[arg(long)]
        set: Option<String>,
    },

    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that open the save and act on it
#[derive(Subcommand)]
enum SessionCommand {
    /// Show level, XP and streak
    Status,

    /// List today's habits
    Habits,

    /// Increment a habit by its step
    Inc {
        /// Habit id (1-6)
        id: String,
    },

    /// Show completed days, newest first
    History,

    /// Show achievements
    Achievements {
        /// Include locked achievements
        #[arg(long)]
        all: bool,
    },

    /// Switch display language
    Language {
        /// en or es
        language: String,
    },

    /// Set the theme, or toggle it when no value is given
    Theme {
        /// light or dark
        theme: Option<String>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AscendConfig::load_from(path)?,
        None => AscendConfig::load()?,
    };

    match cli.command {
        Commands::Config { set } => commands::config(config, cli.config.as_deref(), set.as_deref()),
        Commands::Session(command) => run_session(&config, command).await,
    }
}

async fn run_session(config: &AscendConfig, command: SessionCommand) -> Result<()> {
    let mut app = commands::App::start(config).await;
    let result = match command {
        SessionCommand::Status => commands::status(&app),
        SessionCommand::Habits => commands::habits(&app),
        SessionCommand::Inc { id } => commands::increment(&mut app, &id),
        SessionCommand::History => commands::history(&app),
        SessionCommand::Achievements { all } => commands::achievements(&app, all),
        SessionCommand::Language { language } => commands::language(&mut app, &language),
        SessionCommand::Theme { theme } => commands::theme(&mut app, theme.as_deref()),
    };
    app.finish().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_does_not_open_a_session() {
        let cli = Cli::try_parse_from(["ascendctl", "config", "--set", "theme=dark"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { set: Some(ref s) } if s == "theme=dark"));

        let cli = Cli::try_parse_from(["ascendctl", "inc", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Session(SessionCommand::Inc { ref id }) if id == "3"));
    }
}
