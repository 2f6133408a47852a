//! Parser configuration: compiler mode and expression length limit.

use std::fmt;
use std::str::FromStr;

use spel_parse::DEFAULT_MAX_EXPRESSION_LENGTH;

/// Environment variable selecting the [`CompilerMode`].
pub const COMPILER_MODE_ENV: &str = "SPEL_COMPILER_MODE";

/// Environment variable overriding the maximum expression length.
pub const MAX_EXPRESSION_LENGTH_ENV: &str = "SPEL_MAX_EXPRESSION_LENGTH";

/// When parsed expressions are compiled.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum CompilerMode {
    /// Always interpret.
    #[default]
    Off,
    /// Compile as soon as an interpretation succeeds. Failures of the
    /// compiled form are reported to the caller.
    Immediate,
    /// Compile after a run of interpretations. If the compiled form fails,
    /// drop it and interpret instead.
    Mixed,
}

impl CompilerMode {
    pub fn name(self) -> &'static str {
        match self {
            CompilerMode::Off => "off",
            CompilerMode::Immediate => "immediate",
            CompilerMode::Mixed => "mixed",
        }
    }
}

impl fmt::Display for CompilerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompilerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(CompilerMode::Off),
            "immediate" => Ok(CompilerMode::Immediate),
            "mixed" => Ok(CompilerMode::Mixed),
            _ => Err(ConfigError::InvalidCompilerMode(s.to_owned())),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid compiler mode '{0}' (expected off, immediate or mixed)")]
    InvalidCompilerMode(String),

    #[error("invalid maximum expression length '{0}'")]
    InvalidMaxLength(String),
}

/// Settings shared by every expression a parser produces.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SpelParserConfiguration {
    pub compiler_mode: CompilerMode,
    pub max_expression_length: usize,
}

impl Default for SpelParserConfiguration {
    fn default() -> Self {
        SpelParserConfiguration {
            compiler_mode: CompilerMode::Off,
            max_expression_length: DEFAULT_MAX_EXPRESSION_LENGTH,
        }
    }
}

impl SpelParserConfiguration {
    pub fn new(compiler_mode: CompilerMode) -> Self {
        SpelParserConfiguration {
            compiler_mode,
            ..SpelParserConfiguration::default()
        }
    }

    #[must_use]
    pub fn with_max_expression_length(mut self, max: usize) -> Self {
        self.max_expression_length = max;
        self
    }

    /// Defaults overridden by `SPEL_COMPILER_MODE` and
    /// `SPEL_MAX_EXPRESSION_LENGTH` where set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = SpelParserConfiguration::default();
        if let Some(mode) = lookup(COMPILER_MODE_ENV) {
            config.compiler_mode = mode.parse()?;
        }
        if let Some(max) = lookup(MAX_EXPRESSION_LENGTH_ENV) {
            config.max_expression_length = max
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidMaxLength(max.clone()))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn modes_parse_case_insensitively() {
        assert_eq!("MIXED".parse::<CompilerMode>(), Ok(CompilerMode::Mixed));
        assert_eq!(" off ".parse::<CompilerMode>(), Ok(CompilerMode::Off));
        assert_eq!(
            "sometimes".parse::<CompilerMode>(),
            Err(ConfigError::InvalidCompilerMode("sometimes".to_owned()))
        );
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = SpelParserConfiguration::from_lookup(|key| match key {
            COMPILER_MODE_ENV => Some("immediate".to_owned()),
            MAX_EXPRESSION_LENGTH_ENV => Some("64".to_owned()),
            _ => None,
        });
        assert_eq!(
            config,
            Ok(SpelParserConfiguration {
                compiler_mode: CompilerMode::Immediate,
                max_expression_length: 64,
            })
        );

        let unset = SpelParserConfiguration::from_lookup(|_| None);
        assert_eq!(unset, Ok(SpelParserConfiguration::default()));

        let bad = SpelParserConfiguration::from_lookup(|key| {
            (key == MAX_EXPRESSION_LENGTH_ENV).then(|| "lots".to_owned())
        });
        assert_eq!(bad, Err(ConfigError::InvalidMaxLength("lots".to_owned())));
    }
}
