//! Pipeline error taxonomy.
//!
//! Build-time failures are fatal: a bundle that silently skipped a module or
//! a transformation step is worse than no bundle. Every variant names the
//! offending file and, where one exists, the rule or loader responsible, so
//! the fix is findable without spelunking.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A fatal build failure. Aborts the build; no output is written.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An import specifier matched nothing in any search root.
    #[error("cannot resolve `{specifier}` imported from {from}")]
    ModuleNotFound { specifier: String, from: PathBuf },

    /// More than one rule matched a file. Merge order across rules is
    /// undefined, so this is a configuration error, never a silent merge.
    #[error(
        "rules #{first} and #{second} both match `{path}`; \
         narrow their test/exclude patterns so at most one applies"
    )]
    AmbiguousRule {
        path: String,
        first: usize,
        second: usize,
    },

    /// A loader failed mid-chain.
    #[error("loader `{loader}` failed on {path}")]
    Transformation {
        loader: &'static str,
        path: PathBuf,
        #[source]
        source: LoaderError,
    },

    /// A rule names a loader outside the registry.
    #[error("rule #{rule} names unknown loader `{name}`")]
    UnknownLoader { name: String, rule: usize },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Shutdown was requested mid-build.
    #[error("build cancelled")]
    Cancelled,
}

/// A loader-internal failure, wrapped into [`BuildError::Transformation`]
/// with the loader's identity by the chain executor.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid options: {0}")]
    Options(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_transformation_error_names_loader_and_file() {
        let err = BuildError::Transformation {
            loader: "minify-css",
            path: Path::new("src/theme.css").to_path_buf(),
            source: LoaderError::Parse("unexpected token".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("minify-css"));
        assert!(msg.contains("src/theme.css"));
    }

    #[test]
    fn test_module_not_found_names_specifier_and_importer() {
        let err = BuildError::ModuleNotFound {
            specifier: "./ghost.js".into(),
            from: Path::new("src/main.js").to_path_buf(),
        };
        let msg = err.to_string();
        assert!(msg.contains("./ghost.js"));
        assert!(msg.contains("src/main.js"));
    }

    #[test]
    fn test_ambiguous_rule_names_both_rules() {
        let err = BuildError::AmbiguousRule {
            path: "src/app.js".into(),
            first: 0,
            second: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("#0"));
        assert!(msg.contains("#2"));
        assert!(msg.contains("src/app.js"));
    }
}
