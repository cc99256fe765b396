//! Build mode control.
//!
//! The mode is derived exactly once per invocation from the `--production`
//! flag and threaded through the pipeline as a value; nothing downstream
//! re-reads flags or the environment. Absence of the flag means development.

/// Mode-dependent build settings.
///
/// Mode never toggles features on or off by itself; it only parameterizes
/// the transformations that consume it (via [`BuildMode::defines`]) and the
/// output reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Transformations may spend time shrinking output.
    pub optimize: bool,
    /// Emit per-module size statistics after assembly. Development-only
    /// diagnostics; production output stays quiet.
    pub verbose_stats: bool,
}

impl BuildMode {
    pub const PRODUCTION: Self = Self {
        optimize: true,
        verbose_stats: false,
    };

    pub const DEVELOPMENT: Self = Self {
        optimize: false,
        verbose_stats: true,
    };

    /// Derive the mode from the `--production` flag.
    pub fn from_flags(production: bool) -> Self {
        if production {
            Self::PRODUCTION
        } else {
            Self::DEVELOPMENT
        }
    }

    /// Conditional-compilation symbols active under this mode.
    ///
    /// Development defines `DEBUG`; production defines nothing, so every
    /// debug-only block is stripped from production output.
    pub fn defines(&self) -> &'static [&'static str] {
        if self.is_dev() { &["DEBUG"] } else { &[] }
    }

    pub fn is_dev(&self) -> bool {
        !self.optimize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_is_a_pure_function_of_the_flag() {
        assert_eq!(BuildMode::from_flags(true), BuildMode::PRODUCTION);
        assert_eq!(BuildMode::from_flags(false), BuildMode::DEVELOPMENT);
        // Same flag, same mode, every time.
        assert_eq!(BuildMode::from_flags(true), BuildMode::from_flags(true));
    }

    #[test]
    fn test_absence_of_flag_means_development() {
        let mode = BuildMode::from_flags(false);
        assert!(mode.is_dev());
        assert!(!mode.optimize);
    }

    #[test]
    fn test_development_defines_debug_production_defines_nothing() {
        assert_eq!(BuildMode::DEVELOPMENT.defines(), &["DEBUG"]);
        assert!(BuildMode::PRODUCTION.defines().is_empty());
    }

    #[test]
    fn test_verbose_stats_are_development_only() {
        assert!(BuildMode::DEVELOPMENT.verbose_stats);
        assert!(!BuildMode::PRODUCTION.verbose_stats);
    }
}
