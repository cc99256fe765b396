//! Rule pattern matching.
//!
//! Decides which transformation rule applies to a file path. Patterns are
//! path-fragment regexes over the slash-normalized project-relative path,
//! so rules can key off extensions (`\.js$`) or directory substrings
//! (`modules`). Matching is pure and order-independent per rule.
//!
//! The rule set must be designed so at most one rule matches any given file:
//! merge order across distinct rules is undefined, so an ambiguous match is
//! an error, never a silent merge.

use regex::Regex;

use crate::config::{ConfigError, LoaderSpec, RuleConfig};
use crate::core::BuildError;

/// A rule with its patterns compiled, ready for matching.
#[derive(Debug)]
pub struct CompiledRule {
    /// Position in the declared rule list (for error messages).
    pub index: usize,
    test: Regex,
    exclude: Option<Regex>,
    /// Ordered loader chain, as declared.
    pub loaders: Vec<LoaderSpec>,
}

impl CompiledRule {
    /// A rule matches iff `test` matches the path AND `exclude` is absent or
    /// does not match. A matching `exclude` always wins over `test`.
    pub fn matches(&self, path: &str) -> bool {
        if !self.test.is_match(path) {
            return false;
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(path),
            None => true,
        }
    }
}

/// The full rule set, fully materialized before any file is processed.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every rule's patterns. Malformed patterns fail here, before
    /// any file enters the pipeline.
    pub fn compile(rules: &[RuleConfig]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let test = Regex::new(&rule.test).map_err(|e| {
                    ConfigError::Validation(format!("rule #{index} test pattern: {e}"))
                })?;
                let exclude = rule
                    .exclude
                    .as_deref()
                    .map(Regex::new)
                    .transpose()
                    .map_err(|e| {
                        ConfigError::Validation(format!("rule #{index} exclude pattern: {e}"))
                    })?;
                Ok(CompiledRule {
                    index,
                    test,
                    exclude,
                    loaders: rule.loaders.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { rules })
    }

    /// Find the rule applying to a path.
    ///
    /// - no rule matches: `Ok(None)`, the file passes through unmodified
    /// - exactly one matches: `Ok(Some(rule))`
    /// - more than one matches: `Err(AmbiguousRule)` naming both rules
    pub fn rule_for(&self, path: &str) -> Result<Option<&CompiledRule>, BuildError> {
        let mut found: Option<&CompiledRule> = None;
        for rule in &self.rules {
            if !rule.matches(path) {
                continue;
            }
            if let Some(first) = found {
                return Err(BuildError::AmbiguousRule {
                    path: path.to_string(),
                    first: first.index,
                    second: rule.index,
                });
            }
            found = Some(rule);
        }
        Ok(found)
    }

    /// Number of declared rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
