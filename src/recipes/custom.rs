//! Recipes declared in settings.

use super::RecipeError;
use super::recipe::{BatchCommand, Recipe};
use super::rule::{Action, FixedSet, Matcher, Rule, Template};
use crate::config::{RecipeConfig, RuleConfig};

/// Build a [`Recipe`] from its settings declaration.
pub fn from_config(config: &RecipeConfig) -> Result<Recipe, RecipeError> {
    let mut recipe = Recipe::new(&config.name);

    for (index, rule) in config.rules.iter().enumerate() {
        let invalid = |reason: &str| RecipeError::InvalidRule {
            recipe: config.name.clone(),
            index,
            reason: reason.to_string(),
        };

        let matcher = matcher(rule).ok_or_else(|| {
            invalid("expected exactly one of `exact`, `glob` or `regex`")
        })??;
        let action = action(rule).ok_or_else(|| {
            invalid("expected exactly one of `run`, `derive`, `fixed` or `fixed_glob`")
        })??;

        if !matches!(action, Action::RunCommand(_)) && config.command.is_none() {
            return Err(invalid("derived and fixed paths need a recipe `command`"));
        }

        recipe = recipe.rule(Rule::new(matcher, action));
    }

    if let Some(command) = &config.command {
        recipe = recipe.batch(BatchCommand::new(command, &config.separator));
    }

    Ok(recipe)
}

/// `None` unless exactly one matcher is set.
fn matcher(rule: &RuleConfig) -> Option<Result<Matcher, RecipeError>> {
    match (&rule.exact, &rule.glob, &rule.regex) {
        (Some(exact), None, None) => Some(Ok(Matcher::exact(exact))),
        (None, Some(glob), None) => Some(Matcher::glob(glob)),
        (None, None, Some(regex)) => Some(Matcher::regex(regex)),
        _ => None,
    }
}

/// `None` unless exactly one action is set.
fn action(rule: &RuleConfig) -> Option<Result<Action, RecipeError>> {
    let set = [
        rule.run.is_some(),
        !rule.derive.is_empty(),
        !rule.fixed.is_empty(),
        rule.fixed_glob.is_some(),
    ];
    if set.iter().filter(|s| **s).count() != 1 {
        return None;
    }

    if let Some(run) = &rule.run {
        return Some(Ok(Action::RunCommand(Template::new(run))));
    }
    if !rule.derive.is_empty() {
        let templates = rule.derive.iter().map(Template::new).collect();
        return Some(Ok(Action::DerivedPaths(templates)));
    }
    if !rule.fixed.is_empty() {
        return Some(Ok(Action::FixedOverride(FixedSet::Paths(rule.fixed.clone()))));
    }
    rule.fixed_glob
        .as_deref()
        .map(|glob| FixedSet::glob(glob).map(Action::FixedOverride))
}
