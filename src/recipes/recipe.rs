//! Recipes: named rule sets registered as a single chain handler.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::rule::{Action, Captures, FixedSet, Rule};
use crate::chain::{ChainContext, ChainError, ChangedFileSet, Handler, HandlerOutcome};

/// Command issued once per batch over a recipe's result paths.
///
/// `{files}` in the template is replaced by the paths joined with
/// `separator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommand {
    pub template: String,
    pub separator: String,
}

impl BatchCommand {
    pub fn new(template: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            separator: separator.into(),
        }
    }

    pub fn render(&self, paths: &[String]) -> String {
        self.template
            .replace("{files}", &paths.join(&self.separator))
    }
}

/// Result of matching a recipe's rules against a working set.
#[derive(Debug, Default)]
pub struct Scan<'r> {
    pub remaining: ChangedFileSet,
    pub claimed: Vec<String>,
    /// Distinct commands from `RunCommand` rules, first-seen order.
    pub commands: Vec<String>,
    /// Paths from `DerivedPaths` rules, deduplicated and sorted.
    pub derived: BTreeSet<String>,
    /// Set by the first `FixedOverride` rule that matched.
    pub fixed: Option<&'r FixedSet>,
}

/// A named, ordered list of rules.
///
/// Each file is tested against the rules in declaration order; the first
/// rule that matches claims it.
#[derive(Debug, Clone)]
pub struct Recipe {
    name: String,
    rules: Vec<Rule>,
    batch: Option<BatchCommand>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            batch: None,
        }
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn batch(mut self, batch: BatchCommand) -> Self {
        self.batch = Some(batch);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn first_match(&self, path: &str) -> Option<(&Rule, Captures)> {
        self.rules
            .iter()
            .find_map(|rule| rule.matcher.captures(path).map(|caps| (rule, caps)))
    }

    /// Match every file without running anything.
    pub fn scan(&self, files: ChangedFileSet) -> Scan<'_> {
        let mut commands: Vec<String> = Vec::new();
        let mut derived = BTreeSet::new();
        let mut fixed = None;

        let (remaining, claimed) = files.partition(|path| {
            let Some((rule, caps)) = self.first_match(path) else {
                return false;
            };

            match &rule.action {
                Action::RunCommand(template) => {
                    let command = template.render(&caps);
                    if !commands.contains(&command) {
                        commands.push(command);
                    }
                }
                Action::DerivedPaths(templates) => {
                    derived.extend(templates.iter().map(|t| t.render(&caps)));
                }
                Action::FixedOverride(set) => {
                    fixed.get_or_insert(set);
                }
            }
            true
        });

        Scan {
            remaining,
            claimed,
            commands,
            derived,
            fixed,
        }
    }

    /// Final result paths: the override set if one fired, otherwise the
    /// derived paths, keeping only those that exist.
    fn result_paths(&self, scan: &Scan<'_>, ctx: &ChainContext) -> Result<Vec<String>, ChainError> {
        let candidates: BTreeSet<String> = match scan.fixed {
            Some(set) => set.resolve(&ctx.root)?.into_iter().collect(),
            None => scan.derived.clone(),
        };

        Ok(candidates
            .into_iter()
            .filter(|path| ctx.resolve(path).exists())
            .collect())
    }
}

#[async_trait]
impl Handler for Recipe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(
        &self,
        files: ChangedFileSet,
        ctx: &ChainContext,
    ) -> Result<HandlerOutcome, ChainError> {
        let scan = self.scan(files);
        if scan.claimed.is_empty() {
            return Ok(HandlerOutcome::pass(scan.remaining));
        }

        let paths = self.result_paths(&scan, ctx)?;

        for command in &scan.commands {
            ctx.executor.execute(command).await;
        }

        match &self.batch {
            Some(batch) if !paths.is_empty() => {
                ctx.executor.execute(&batch.render(&paths)).await;
            }
            _ => {
                if !scan.derived.is_empty() || scan.fixed.is_some() {
                    crate::debug_event!(self.name, "nothing to run", "no existing targets");
                }
            }
        }

        Ok(HandlerOutcome {
            remaining: scan.remaining,
            claimed: scan.claimed,
        })
    }
}
