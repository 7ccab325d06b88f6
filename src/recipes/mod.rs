//! Pattern-matching recipes and the built-in handlers.
//!
//! A [`Recipe`] is an ordered list of [`Rule`]s. Each rule pairs a
//! [`Matcher`] (exact, glob or regex) with an [`Action`]: run a command,
//! derive result paths from the captures, or substitute a fixed result set.
//! The recipe claims every file one of its rules matches and finishes with
//! a single batched command over the result paths.

mod could_not_handle;
mod custom;
mod execute_command;
pub mod jstest;
pub mod rails;
mod recipe;
mod rule;

pub use could_not_handle::CouldNotHandle;
pub use custom::from_config;
pub use execute_command::ExecuteCommand;
pub use recipe::{BatchCommand, Recipe, Scan};
pub use rule::{Action, Captures, FixedSet, Matcher, Rule, Template};

use thiserror::Error;

use crate::chain::{Phase, Registry};
use crate::config::Settings;

/// Names accepted by `-r/--recipe`.
pub const BUILTIN_RECIPES: &[&str] = &["rails", "jstest"];

/// Errors building recipes. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("Recipe `{name}' does not exist.")]
    Unknown { name: String },

    #[error("Invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Invalid glob '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("Recipe '{recipe}' rule {index}: {reason}")]
    InvalidRule {
        recipe: String,
        index: usize,
        reason: String,
    },
}

/// Look up a built-in recipe by name.
pub fn builtin(name: &str) -> Result<Recipe, RecipeError> {
    match name {
        "rails" => rails::recipe(),
        "jstest" => jstest::recipe(),
        _ => Err(RecipeError::Unknown {
            name: name.to_string(),
        }),
    }
}

/// Register every handler the settings ask for.
///
/// Order: the fallback in `PostProcess`; then in `Process` each execute
/// command, the named built-in recipes, and finally declared recipes.
pub fn build_registry(settings: &Settings) -> Result<Registry, RecipeError> {
    let mut registry = Registry::new();
    registry.register(Phase::PostProcess, CouldNotHandle);

    for command in &settings.execute {
        registry.register(Phase::Process, ExecuteCommand::new(command));
    }

    let mut enabled: Vec<&str> = Vec::new();
    for name in &settings.recipes {
        if enabled.contains(&name.as_str()) {
            continue;
        }
        registry.register(Phase::Process, builtin(name)?);
        enabled.push(name);
    }

    for config in &settings.custom_recipes {
        registry.register(Phase::Process, from_config(config)?);
    }

    Ok(registry)
}
