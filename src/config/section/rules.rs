//! `[[rules]]` section configuration.
//!
//! Each rule pairs a path pattern with an ordered loader chain. A rule with
//! no matching files is inert; a file matched by no rule passes through the
//! pipeline unmodified.
//!
//! # Example
//!
//! ```toml
//! [[rules]]
//! test = "\\.js$"        # regex over the slash-normalized relative path
//! exclude = "modules"    # optional; a matching exclude always wins
//!
//! [[rules.loaders]]
//! name = "minify-js"
//! [rules.loaders.options]
//! mangle = true
//! ```
//!
//! Loaders are declared first-to-last but applied in REVERSE order: the
//! last-listed loader consumes the raw content and the first-listed one
//! produces the final output (see `crate::loader::chain`).

use serde::{Deserialize, Serialize};

/// One transformation rule: a pattern, an optional exclude, a loader chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Path-fragment regex a file must match.
    pub test: String,

    /// Path-fragment regex that vetoes the match when it also matches.
    #[serde(default)]
    pub exclude: Option<String>,

    /// Ordered loader chain (applied in reverse declaration order).
    #[serde(default)]
    pub loaders: Vec<LoaderSpec>,
}

/// Opaque transformation identifier plus its static options bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSpec {
    /// Loader identifier; must name an entry of the builtin registry.
    pub name: String,

    /// Options understood only by that loader. Merged over the mode-derived
    /// options at invocation time; these static keys win on collision.
    #[serde(default)]
    pub options: toml::Table,
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_rules_config() {
        let config = test_parse_config(
            r#"
[[rules]]
test = "\\.css$"

[[rules.loaders]]
name = "banner"
[rules.loaders.options]
text = "generated"

[[rules.loaders]]
name = "minify-css"
"#,
        );

        assert_eq!(config.rules.len(), 1);
        let rule = &config.rules[0];
        assert_eq!(rule.test, "\\.css$");
        assert!(rule.exclude.is_none());
        assert_eq!(rule.loaders.len(), 2);
        assert_eq!(rule.loaders[0].name, "banner");
        assert_eq!(
            rule.loaders[0].options.get("text").and_then(|v| v.as_str()),
            Some("generated")
        );
        assert_eq!(rule.loaders[1].name, "minify-css");
        assert!(rule.loaders[1].options.is_empty());
    }

    #[test]
    fn test_rules_exclude_field() {
        let config = test_parse_config("[[rules]]\ntest = \"\\\\.js$\"\nexclude = \"modules\"");
        assert_eq!(config.rules[0].exclude.as_deref(), Some("modules"));
    }
}
