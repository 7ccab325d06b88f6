//! CLI argument parsing using clap.

use clap::{
    Parser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::config::Settings;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Watch files and run commands when they change
#[derive(Parser, Debug)]
#[command(
    name = "kicker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Watch files and run commands when they change",
    long_about = "Watches the given paths and runs commands or recipes for every batch of changed files.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  kicker -e 'cargo test' src\n  kicker -r rails\n  kicker -r jstest --notify test/javascripts\n\nBuilt-in recipes: rails, jstest"
)]
pub struct Cli {
    /// Paths to watch (default: current directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Command to run on change (may be repeated)
    #[arg(short, long = "execute", value_name = "COMMAND")]
    pub execute: Vec<String>,

    /// Built-in recipe to enable (may be repeated)
    #[arg(short, long = "recipe", value_name = "NAME")]
    pub recipe: Vec<String>,

    /// Seconds to wait for more events before handling a batch
    #[arg(short, long, value_name = "SECONDS")]
    pub latency: Option<f64>,

    /// Send desktop notifications
    #[arg(long, visible_alias = "growl", overrides_with = "no_notify")]
    pub notify: bool,

    /// Disable desktop notifications
    #[arg(long, visible_alias = "no-growl", overrides_with = "notify")]
    pub no_notify: bool,

    /// Command run when a success notification is clicked
    #[arg(long, visible_alias = "growl-command", value_name = "COMMAND")]
    pub notify_command: Option<String>,

    /// Path to a custom settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the effective settings and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Apply flag overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if !self.paths.is_empty() {
            settings.paths = self.paths.clone();
        }
        settings.execute.extend(self.execute.iter().cloned());
        settings.recipes.extend(self.recipe.iter().cloned());

        if let Some(seconds) = self.latency {
            settings.latency_ms = (seconds.max(0.0) * 1000.0).round() as u64;
        }

        if self.notify {
            settings.notifications.enabled = true;
        }
        if self.no_notify {
            settings.notifications.enabled = false;
        }
        if let Some(command) = &self.notify_command {
            settings.notifications.click_command = Some(command.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kicker").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repeatable_flags_and_paths() {
        let cli = parse(&["-e", "ls", "--execute", "pwd", "-r", "rails", "app", "lib"]);
        assert_eq!(cli.execute, vec!["ls", "pwd"]);
        assert_eq!(cli.recipe, vec!["rails"]);
        assert_eq!(cli.paths, vec![PathBuf::from("app"), PathBuf::from("lib")]);
    }

    #[test]
    fn test_apply_overrides_settings() {
        let mut settings = Settings {
            execute: vec!["make".to_string()],
            ..Settings::default()
        };
        parse(&["-e", "ls", "-l", "0.25", "--notify", "--notify-command", "open ."])
            .apply(&mut settings);

        assert_eq!(settings.execute, vec!["make", "ls"]);
        assert_eq!(settings.latency_ms, 250);
        assert!(settings.notifications.enabled);
        assert_eq!(
            settings.notifications.click_command.as_deref(),
            Some("open .")
        );
        assert_eq!(settings.paths, vec![PathBuf::from(".")]);
    }

    #[test]
    fn test_growl_aliases() {
        let mut settings = Settings::default();
        parse(&["--growl", "--growl-command", "ls"]).apply(&mut settings);
        assert!(settings.notifications.enabled);
        assert_eq!(settings.notifications.click_command.as_deref(), Some("ls"));

        let mut settings = Settings::default();
        settings.notifications.enabled = true;
        parse(&["--no-growl"]).apply(&mut settings);
        assert!(!settings.notifications.enabled);
    }

    #[test]
    fn test_last_notify_flag_wins() {
        let cli = parse(&["--notify", "--no-notify"]);
        assert!(!cli.notify);
        assert!(cli.no_notify);
    }
}
