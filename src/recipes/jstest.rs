//! jstest recipe: run HTML test pages for changed JavaScript.

use super::RecipeError;
use super::recipe::{BatchCommand, Recipe};
use super::rule::{Matcher, Rule};

pub fn recipe() -> Result<Recipe, RecipeError> {
    Ok(Recipe::new("jstest")
        .rule(Rule::derive(
            Matcher::regex(r"^test/javascripts/(.+)_test\.(js|html)$")?,
            "test/javascripts/$1_test.html",
        ))
        .rule(Rule::derive(
            Matcher::regex(r"^public/javascripts/(.+)\.js$")?,
            "test/javascripts/$1_test.html",
        ))
        .batch(BatchCommand::new("jstest {files}", " ")))
}
