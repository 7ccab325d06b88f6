//! Configuration for the watcher.
//!
//! Layered configuration, later layers win:
//! - Default values
//! - User settings at `~/.kick/settings.toml`
//! - Project settings at `./.kick.toml`
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `KICKER_` and use double
//! underscores to separate nested levels:
//! - `KICKER_LATENCY_MS=500` sets `latency_ms`
//! - `KICKER_NOTIFICATIONS__ENABLED=true` sets `notifications.enabled`
//!
//! # Recipes
//!
//! Besides enabling built-in recipes by name, settings can declare recipes:
//!
//! ```toml
//! [[recipe]]
//! name = "specs"
//! command = "rspec {files}"
//!
//! [[recipe.rule]]
//! regex = '^lib/(.+)\.rb$'
//! derive = ["spec/$1_spec.rb"]
//!
//! [[recipe.rule]]
//! exact = "spec/spec_helper.rb"
//! fixed_glob = "spec/**/*_spec.rb"
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Project-level settings file, looked up in the working directory.
pub const PROJECT_SETTINGS_FILE: &str = ".kick.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Paths to watch
    #[serde(default = "default_paths")]
    pub paths: Vec<PathBuf>,

    /// Event coalescing window in milliseconds
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Commands run on every change, in order
    #[serde(default)]
    pub execute: Vec<String>,

    /// Built-in recipes to enable
    #[serde(default)]
    pub recipes: Vec<String>,

    /// Desktop notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// User-declared recipes
    #[serde(default, rename = "recipe", skip_serializing_if = "Vec::is_empty")]
    pub custom_recipes: Vec<RecipeConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct NotificationConfig {
    /// Send desktop notifications for command results
    #[serde(default)]
    pub enabled: bool,

    /// Command run when a success notification is clicked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_command: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

/// A recipe declared in settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RecipeConfig {
    pub name: String,

    /// Batch command over the result paths; `{files}` is replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Separator used to join result paths
    #[serde(default = "default_separator")]
    pub separator: String,

    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,
}

/// One rule of a declared recipe: a single matcher and a single action.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Command to run for each match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    /// Paths derived from the match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derive: Vec<String>,
    /// Literal result set replacing everything derived
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixed: Vec<String>,
    /// Glob result set replacing everything derived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_glob: Option<String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}
fn default_latency_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_separator() -> String {
    " ".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            paths: default_paths(),
            latency_ms: default_latency_ms(),
            execute: Vec::new(),
            recipes: Vec::new(),
            notifications: NotificationConfig::default(),
            logging: LoggingConfig::default(),
            custom_recipes: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        if let Some(user) = Self::user_config_path() {
            figment = figment.merge(Toml::file(user));
        }

        figment
            .merge(Toml::file(PROJECT_SETTINGS_FILE))
            .merge(Self::env_provider())
            .extract()
            .map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Self::env_provider())
            .extract()
            .map_err(Box::new)
    }

    /// `~/.kick/settings.toml`, if a home directory is known
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".kick").join("settings.toml"))
    }

    fn env_provider() -> Env {
        // Double underscore separates nested levels; single underscores
        // stay within field names.
        Env::prefixed("KICKER_").map(|key| key.as_str().to_lowercase().replace("__", ".").into())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
