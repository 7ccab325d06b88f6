//! Rules: a matcher over a file path plus the action it triggers.

use std::collections::HashMap;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use regex::Regex;

use super::RecipeError;
use crate::chain::ChainError;

/// `*` stays within one path segment; `**` crosses segments.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Capture groups from a successful match.
///
/// Group 0 is always the whole path. Only regex matchers produce further
/// groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    groups: Vec<String>,
    named: HashMap<String, String>,
}

impl Captures {
    fn whole(path: &str) -> Self {
        Self {
            groups: vec![path.to_string()],
            named: HashMap::new(),
        }
    }

    /// Positional group, or `""` when the group did not participate.
    pub fn group(&self, index: usize) -> &str {
        self.groups.get(index).map(String::as_str).unwrap_or("")
    }

    /// Named group; numeric names fall back to positional groups.
    pub fn get(&self, name: &str) -> &str {
        if let Ok(index) = name.parse::<usize>() {
            return self.group(index);
        }
        self.named.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Pattern over a relative file path.
#[derive(Debug, Clone)]
pub enum Matcher {
    Exact(String),
    Glob(Pattern),
    Regex(Regex),
}

impl Matcher {
    pub fn exact(path: impl Into<String>) -> Self {
        Matcher::Exact(path.into())
    }

    pub fn glob(pattern: &str) -> Result<Self, RecipeError> {
        Pattern::new(pattern)
            .map(Matcher::Glob)
            .map_err(|e| RecipeError::InvalidGlob {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn regex(pattern: &str) -> Result<Self, RecipeError> {
        Regex::new(pattern)
            .map(Matcher::Regex)
            .map_err(|e| RecipeError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Match `path`, returning its captures on success.
    pub fn captures(&self, path: &str) -> Option<Captures> {
        match self {
            Matcher::Exact(expected) => (expected == path).then(|| Captures::whole(path)),
            Matcher::Glob(pattern) => pattern
                .matches_with(path, GLOB_OPTIONS)
                .then(|| Captures::whole(path)),
            Matcher::Regex(regex) => {
                let caps = regex.captures(path)?;
                let groups = caps
                    .iter()
                    .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                let named = regex
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_string(), m.as_str().to_string()))
                    })
                    .collect();
                Some(Captures { groups, named })
            }
        }
    }
}

/// Text with capture references.
///
/// `$0` is the whole path, `$1`..`$N` are positional groups, `${N}` and
/// `${name}` are braced forms, `$$` is a literal dollar. A bare `$N` takes
/// digits only, so `$1_test.rb` means group 1 followed by `_test.rb`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Template(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, caps: &Captures) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut chars = self.0.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }

            match chars.peek().copied() {
                Some('$') => {
                    chars.next();
                    out.push('$');
                }
                Some('{') => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if closed {
                        out.push_str(caps.get(&name));
                    } else {
                        out.push_str("${");
                        out.push_str(&name);
                    }
                }
                Some(d) if d.is_ascii_digit() => {
                    let mut digits = String::new();
                    while let Some(d) = chars.next_if(|d| d.is_ascii_digit()) {
                        digits.push(d);
                    }
                    out.push_str(caps.get(&digits));
                }
                _ => out.push('$'),
            }
        }

        out
    }
}

/// Canonical result set substituted by a [`Action::FixedOverride`] rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixedSet {
    Paths(Vec<String>),
    /// Glob resolved under the working directory at run time.
    Glob(String),
}

impl FixedSet {
    pub fn glob(pattern: &str) -> Result<Self, RecipeError> {
        Pattern::new(pattern).map_err(|e| RecipeError::InvalidGlob {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(FixedSet::Glob(pattern.to_string()))
    }

    /// Expand into concrete paths relative to `root`.
    pub fn resolve(&self, root: &Path) -> Result<Vec<String>, ChainError> {
        match self {
            FixedSet::Paths(paths) => Ok(paths.clone()),
            FixedSet::Glob(pattern) => {
                let full = format!("{}/{pattern}", Pattern::escape(&root.to_string_lossy()));
                let entries = glob::glob(&full).map_err(|e| ChainError::Glob {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;

                let mut paths = Vec::new();
                for entry in entries {
                    match entry {
                        Ok(path) => {
                            let rel = path.strip_prefix(root).unwrap_or(&path);
                            paths.push(rel.to_string_lossy().into_owned());
                        }
                        Err(e) => {
                            tracing::debug!("[recipe] skipping unreadable glob entry: {e}");
                        }
                    }
                }
                Ok(paths)
            }
        }
    }
}

/// What a matching rule produces.
#[derive(Debug, Clone)]
pub enum Action {
    /// Run a command rendered from the captures.
    RunCommand(Template),
    /// Add rendered paths to the recipe's result set.
    DerivedPaths(Vec<Template>),
    /// Replace the recipe's whole result set.
    FixedOverride(FixedSet),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub action: Action,
}

impl Rule {
    pub fn new(matcher: Matcher, action: Action) -> Self {
        Self { matcher, action }
    }

    /// Map a match to a single derived path.
    pub fn derive(matcher: Matcher, template: &str) -> Self {
        Self::new(matcher, Action::DerivedPaths(vec![Template::new(template)]))
    }

    pub fn run(matcher: Matcher, command: &str) -> Self {
        Self::new(matcher, Action::RunCommand(Template::new(command)))
    }

    pub fn fixed(matcher: Matcher, set: FixedSet) -> Self {
        Self::new(matcher, Action::FixedOverride(set))
    }
}
